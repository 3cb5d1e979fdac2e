mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use common::MemObjectStore;
use roadwatch_core::{ImageRef, ResolveError};
use roadwatch_daemon::resolver::{
    resolve, storage_object_path, FsObjectStore, ObjectStore, IMAGE_MIME,
};

fn http() -> reqwest::Client {
    reqwest::Client::new()
}

#[test]
fn storage_uri_strips_scheme_and_root() {
    assert_eq!(
        storage_object_path("store://media/hazards/a.jpg"),
        Some("hazards/a.jpg")
    );
    assert_eq!(storage_object_path("store://media/a.jpg"), Some("a.jpg"));
    assert_eq!(storage_object_path("store://media/"), None);
    assert_eq!(storage_object_path("store://media"), None);
    assert_eq!(storage_object_path("http://media/a.jpg"), None);
}

#[tokio::test]
async fn fs_store_round_trips_objects() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsObjectStore::new(dir.path());

    assert!(!store.exists("hazards/a.jpg").await.unwrap());
    store.upload("hazards/a.jpg", b"jpeg-bytes").await.unwrap();
    assert!(store.exists("hazards/a.jpg").await.unwrap());
    assert_eq!(store.download("hazards/a.jpg").await.unwrap(), b"jpeg-bytes");
}

#[tokio::test]
async fn fs_store_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsObjectStore::new(dir.path());

    assert!(store.download("../secret").await.is_err());
    assert!(store.upload("a/../../b.jpg", b"x").await.is_err());
}

#[tokio::test]
async fn resolves_storage_reference() {
    let store = MemObjectStore::with("hazards/a.jpg", b"jpeg-bytes");
    let image_ref = ImageRef::Storage {
        uri: "store://media/hazards/a.jpg".into(),
    };

    let (bytes, mime) = resolve(&image_ref, &store, &http()).await.unwrap();
    assert_eq!(bytes, b"jpeg-bytes");
    assert_eq!(mime, IMAGE_MIME);
}

#[tokio::test]
async fn missing_storage_object_is_not_found() {
    let store = MemObjectStore::default();
    let image_ref = ImageRef::Storage {
        uri: "store://media/hazards/nope.jpg".into(),
    };

    let err = resolve(&image_ref, &store, &http()).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(_)));
}

#[tokio::test]
async fn resolves_inline_base64() {
    let store = MemObjectStore::default();
    let image_ref = ImageRef::Inline {
        data: BASE64.encode(b"raw-bytes"),
    };

    let (bytes, _) = resolve(&image_ref, &store, &http()).await.unwrap();
    assert_eq!(bytes, b"raw-bytes");
}

#[tokio::test]
async fn blank_or_invalid_inline_data_is_empty() {
    let store = MemObjectStore::default();

    for data in ["", "   ", "not-base64!!!"] {
        let image_ref = ImageRef::Inline { data: data.into() };
        let err = resolve(&image_ref, &store, &http()).await.unwrap_err();
        assert!(matches!(err, ResolveError::Empty), "data: {data:?}");
    }
}

#[tokio::test]
async fn unsupported_scheme_is_rejected() {
    let store = MemObjectStore::default();
    let image_ref = ImageRef::from_url("ftp://cdn.example.com/img.jpg");

    let err = resolve(&image_ref, &store, &http()).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedReference(_)));
}

#[tokio::test]
async fn missing_reference_is_rejected() {
    let store = MemObjectStore::default();

    let err = resolve(&ImageRef::Missing, &store, &http()).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedReference(_)));
}

#[tokio::test]
async fn malformed_storage_uri_is_unsupported() {
    let store = MemObjectStore::default();
    let image_ref = ImageRef::Storage {
        uri: "store://media".into(),
    };

    let err = resolve(&image_ref, &store, &http()).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedReference(_)));
}
