use hondana_storage::Storage;

#[tokio::test]
async fn on_disk_store_bootstraps_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().to_str().unwrap().to_string();

    let storage = Storage::new(&data_dir).await.unwrap();
    let user_id = storage.create_user("alice").await.unwrap();
    storage.pool.close().await;
    drop(storage);

    let storage = Storage::new(&data_dir).await.unwrap();
    let user = storage.get_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.name, "alice");
}
