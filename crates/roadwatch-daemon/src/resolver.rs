use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roadwatch_core::{ImageRef, ResolveError};
use std::path::{Component, Path, PathBuf};

/// MIME hint sent with every image. The pipeline does not sniff formats;
/// the oracle gets an optimistic hint.
pub const IMAGE_MIME: &str = "image/jpeg";

/// Backend for `store://` references. Faked in tests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;
    async fn download(&self, path: &str) -> Result<Vec<u8>>;
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()>;
}

/// Local-filesystem object store rooted at the daemon's media directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Object paths are relative and may not traverse upward.
    fn object_path(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path.trim_start_matches('/'));
        for comp in rel.components() {
            match comp {
                Component::Normal(_) => {}
                _ => bail!("invalid object path: {path}"),
            }
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.object_path(path)?;
        Ok(tokio::fs::try_exists(&full).await?)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.object_path(path)?;
        tokio::fs::read(&full)
            .await
            .with_context(|| format!("reading object {path}"))
    }

    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.object_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .with_context(|| format!("writing object {path}"))
    }
}

/// Strip the scheme and root segment of a storage URI, leaving the
/// object path: `store://media/hazards/a.jpg` -> `hazards/a.jpg`.
pub fn storage_object_path(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix("store://")?;
    let (_root, path) = rest.split_once('/')?;
    if path.is_empty() {
        return None;
    }
    Some(path)
}

/// Resolve an image reference to raw bytes plus a MIME hint.
pub async fn resolve(
    image_ref: &ImageRef,
    store: &dyn ObjectStore,
    http: &reqwest::Client,
) -> Result<(Vec<u8>, &'static str), ResolveError> {
    match image_ref {
        ImageRef::Storage { uri } => {
            let path = storage_object_path(uri)
                .ok_or_else(|| ResolveError::UnsupportedReference(uri.clone()))?;
            let exists = store
                .exists(path)
                .await
                .map_err(|e| ResolveError::Transport(format!("{e:#}")))?;
            if !exists {
                return Err(ResolveError::NotFound(uri.clone()));
            }
            let bytes = store
                .download(path)
                .await
                .map_err(|e| ResolveError::Transport(format!("{e:#}")))?;
            Ok((bytes, IMAGE_MIME))
        }
        ImageRef::Http { url } => {
            let resp = http
                .get(url)
                .send()
                .await
                .map_err(|e| ResolveError::Transport(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ResolveError::FetchFailed(status.as_u16()));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| ResolveError::Transport(e.to_string()))?;
            Ok((bytes.to_vec(), IMAGE_MIME))
        }
        ImageRef::Inline { data } => {
            let trimmed = data.trim();
            if trimmed.is_empty() {
                return Err(ResolveError::Empty);
            }
            let bytes = BASE64.decode(trimmed).map_err(|_| ResolveError::Empty)?;
            if bytes.is_empty() {
                return Err(ResolveError::Empty);
            }
            Ok((bytes, IMAGE_MIME))
        }
        ImageRef::Unsupported { uri } => Err(ResolveError::UnsupportedReference(uri.clone())),
        ImageRef::Missing => {
            Err(ResolveError::UnsupportedReference("no image reference".to_string()))
        }
    }
}
