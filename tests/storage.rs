use hostel::storage::{Bucket, FsImageStore, ImageStore, ImageStoreError};
use std::path::Path;

#[tokio::test]
async fn new_creates_every_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("uploads");
    FsImageStore::new(&base).await.unwrap();
    for sub in ["lost_found", "complaints", "menu"] {
        assert!(base.join(sub).is_dir(), "{sub} missing");
    }
    // second start over existing directories is fine
    FsImageStore::new(&base).await.unwrap();
}

#[tokio::test]
async fn save_stays_inside_bucket_and_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path()).await.unwrap();

    let path = store.save(Bucket::LostFound, "../../escape.png", b"png-bytes").await.unwrap();
    let p = Path::new(&path);
    assert_eq!(p.parent().unwrap(), dir.path().join("lost_found"));
    let file_name = p.file_name().unwrap().to_str().unwrap();
    assert!(file_name.ends_with("_escape.png"), "{file_name}");
    assert!(!file_name.contains(".."));

    assert_eq!(store.load(&path).await.unwrap(), b"png-bytes");
}

#[tokio::test]
async fn same_name_twice_gets_distinct_paths() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path()).await.unwrap();
    let a = store.save(Bucket::Menu, "menu.jpg", b"one").await.unwrap();
    let b = store.save(Bucket::Menu, "menu.jpg", b"two").await.unwrap();
    assert_ne!(a, b);
    assert!(Path::new(&a).file_name().unwrap().to_str().unwrap().starts_with("menu_"));
    assert_eq!(store.load(&a).await.unwrap(), b"one");
    assert_eq!(store.load(&b).await.unwrap(), b"two");
}

#[tokio::test]
async fn missing_file_is_not_found_and_delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path()).await.unwrap();
    let path = store.save(Bucket::Complaints, "tap.png", b"x").await.unwrap();

    store.delete(&path).await.unwrap();
    store.delete(&path).await.unwrap();
    assert!(matches!(store.load(&path).await, Err(ImageStoreError::NotFound)));
}
