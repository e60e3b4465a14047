//! Integration tests for opening a store through [`DbManager`].

use support_core::models::session::CreateSession;
use support_core::repository::SessionRepository;
use support_db::repository::SurrealSessionRepository;
use support_db::{DbConfig, DbManager};

fn embedded(migrate: bool) -> DbConfig {
    DbConfig {
        endpoint: "mem://".into(),
        namespace: "test".into(),
        database: "test".into(),
        migrate,
        ..Default::default()
    }
}

#[tokio::test]
async fn embedded_store_is_migrated_on_connect() {
    let manager = DbManager::connect(&embedded(true)).await.unwrap();

    let mut result = manager
        .client()
        .query("SELECT * FROM _migration")
        .await
        .unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), support_db::latest_version() as usize);

    let repo = SurrealSessionRepository::new(manager.client().clone());
    let session = repo
        .create(CreateSession {
            key: "k1".into(),
            email: "a@x.com".into(),
        })
        .await
        .unwrap();
    let found = repo.find_by_key("k1").await.unwrap().unwrap();
    assert_eq!(found.id, session.id);
}

#[tokio::test]
async fn migrate_flag_off_leaves_store_untouched() {
    let manager = DbManager::connect(&embedded(false)).await.unwrap();

    let mut result = manager.client().query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info);
    assert!(!info_str.contains("support_session"));

    support_db::run_migrations(manager.client()).await.unwrap();
    let mut result = manager
        .client()
        .query("SELECT * FROM _migration")
        .await
        .unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), support_db::latest_version() as usize);
}
