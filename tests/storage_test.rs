mod common;

use std::time::Duration;

use sporlapi::{
    error::Error,
    storage::{JsonFileStore, ProfileStore},
};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> JsonFileStore {
    JsonFileStore::new(dir.path().join("nested").join("profiles.json"))
}

#[tokio::test]
async fn test_missing_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.get_profile_with_email("a@x.com").await.unwrap().is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_created_profile_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let incoming = common::profile(
        "a@x.com",
        common::credentials("access-1", "refresh-1", 3600, 0),
    );

    let created = store_in(&dir)
        .create_or_update_profile(incoming)
        .await
        .unwrap();
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.credentials.created_at, created.credentials.updated_at);

    let reopened = store_in(&dir);
    let loaded = reopened
        .get_profile_with_email("a@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn test_update_keeps_created_at_and_refresh_token() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let first = store
        .create_or_update_profile(common::profile(
            "a@x.com",
            common::credentials("access-1", "refresh-1", 3600, 0),
        ))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = store
        .create_or_update_profile(common::profile(
            "a@x.com",
            common::credentials("access-2", "", 3600, 0),
        ))
        .await
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.credentials.access_token, "access-2");
    assert_eq!(second.credentials.refresh_token, "refresh-1");
}

#[tokio::test]
async fn test_update_credentials() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let created = store
        .create_or_update_profile(common::profile(
            "a@x.com",
            common::credentials("access-1", "refresh-1", 3600, 0),
        ))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let updated = store
        .update_credentials("a@x.com", &common::credentials("access-2", "", 1800, 0))
        .await
        .unwrap();

    assert_eq!(updated.credentials.access_token, "access-2");
    assert_eq!(updated.credentials.refresh_token, "refresh-1");
    assert_eq!(updated.credentials.expires_in, 1800);
    assert_eq!(updated.credentials.created_at, created.credentials.created_at);
    assert!(updated.credentials.updated_at > created.credentials.updated_at);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn test_update_credentials_for_unknown_email_is_not_found() {
    let dir = TempDir::new().unwrap();

    let result = store_in(&dir)
        .update_credentials("nobody@x.com", &common::credentials("a", "r", 3600, 0))
        .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_corrupt_file_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = JsonFileStore::new(path).get_profile_with_email("a@x.com").await;

    assert!(matches!(result, Err(Error::Storage(_))));
}

#[tokio::test]
async fn test_failed_write_keeps_previous_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");
    let store = JsonFileStore::new(&path);
    let created = store
        .create_or_update_profile(common::profile(
            "a@x.com",
            common::credentials("access-1", "refresh-1", 3600, 0),
        ))
        .await
        .unwrap();

    // a directory in the staging spot makes the next write fail
    std::fs::create_dir(dir.path().join("profiles.json.tmp")).unwrap();
    let result = store
        .update_credentials("a@x.com", &common::credentials("access-2", "", 3600, 0))
        .await;
    assert!(matches!(result, Err(Error::Storage(_))));

    let loaded = JsonFileStore::new(&path)
        .get_profile_with_email("a@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn test_successful_write_leaves_no_staging_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.json");

    JsonFileStore::new(&path)
        .create_or_update_profile(common::profile(
            "a@x.com",
            common::credentials("access-1", "refresh-1", 3600, 0),
        ))
        .await
        .unwrap();

    assert!(path.is_file());
    assert!(!dir.path().join("profiles.json.tmp").exists());
}
