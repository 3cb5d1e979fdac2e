#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roadwatch_core::{
    default_labels, now_ms, HazardRecord, ImageRef, Location, OracleError,
};
use roadwatch_daemon::db::Db;
use roadwatch_daemon::oracle::Oracle;
use roadwatch_daemon::pipeline::PipelineDeps;
use roadwatch_daemon::resolver::ObjectStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory object store fake.
#[derive(Default)]
pub struct MemObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemObjectStore {
    pub fn with(path: &str, bytes: &[u8]) -> Self {
        let store = Self::default();
        store
            .objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        store
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl ObjectStore for MemObjectStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(path))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("missing object {path}"))
    }

    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Oracle fake returning a canned reply.
pub struct FakeOracle(pub String);

impl FakeOracle {
    pub fn replying(text: &str) -> Arc<dyn Oracle> {
        Arc::new(Self(text.to_string()))
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn generate(&self, _: &str, _: &[u8], _: &str) -> Result<String, OracleError> {
        Ok(self.0.clone())
    }
}

/// Oracle fake failing with a fixed error kind.
pub struct FailingOracle(pub fn() -> OracleError);

#[async_trait]
impl Oracle for FailingOracle {
    async fn generate(&self, _: &str, _: &[u8], _: &str) -> Result<String, OracleError> {
        Err((self.0)())
    }
}

/// Oracle fake that outlives any reasonable timeout.
pub struct SlowOracle(pub Duration);

#[async_trait]
impl Oracle for SlowOracle {
    async fn generate(&self, _: &str, _: &[u8], _: &str) -> Result<String, OracleError> {
        tokio::time::sleep(self.0).await;
        Ok("{\"isHazard\":false}".to_string())
    }
}

pub async fn test_deps(oracle: Arc<dyn Oracle>, store: Arc<dyn ObjectStore>) -> PipelineDeps {
    let db = Db::connect_memory().await.expect("memory db");
    db.bootstrap_schema().await.expect("schema");
    PipelineDeps {
        db,
        store,
        oracle,
        http: reqwest::Client::new(),
        labels: Arc::new(default_labels()),
        min_confidence: 0.0,
        oracle_timeout: Duration::from_secs(5),
    }
}

pub fn pending_record(id: &str, image_ref: ImageRef) -> HazardRecord {
    HazardRecord::new(
        id.to_string(),
        Location { lat: 3.139, lng: 101.687 },
        image_ref,
        Some("pothole".to_string()),
        Some(0.7),
        now_ms(),
    )
}

pub fn inline_image() -> ImageRef {
    ImageRef::Inline {
        data: BASE64.encode(b"fake-jpeg-bytes"),
    }
}
