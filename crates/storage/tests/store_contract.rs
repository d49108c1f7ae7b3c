use std::collections::HashMap;

use shared::domain::DepartmentFilter;
use storage::{CsvStore, MemoryStore, RegistrationStore, SqliteStore};
use tempfile::TempDir;

async fn sqlite_store() -> SqliteStore {
    SqliteStore::new("sqlite::memory:").await.expect("db")
}

fn csv_store() -> (TempDir, CsvStore) {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let store = CsvStore::new(temp_root.path().join("names.csv"));
    (temp_root, store)
}

fn multiset(items: Vec<String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

async fn assert_registration_lifecycle(store: &dyn RegistrationStore) {
    assert!(!store.exists("Ada", "Lovelace").await.expect("exists"));
    assert!(store
        .add("Ada", "Lovelace", Some("Engineering"))
        .await
        .expect("add"));
    assert!(store.exists("Ada", "Lovelace").await.expect("exists"));
    assert!(!store
        .add("Ada", "Lovelace", Some("Sales"))
        .await
        .expect("duplicate add"));

    assert!(store.delete("Ada", "Lovelace").await.expect("delete"));
    assert!(!store.exists("Ada", "Lovelace").await.expect("exists"));
    assert!(!store.delete("Ada", "Lovelace").await.expect("second delete"));
}

async fn assert_listing_is_stable(store: &dyn RegistrationStore) {
    store.add("Grace", "Hopper", Some("Engineering")).await.expect("add");
    store.add("Joan", "Clarke", Some("Intelligence")).await.expect("add");
    store.add("Katherine", "Johnson", Some("Sales")).await.expect("add");

    let first = store.list(&DepartmentFilter::Any).await.expect("list");
    let second = store.list(&DepartmentFilter::Any).await.expect("list");
    assert_eq!(first.len(), 3);
    assert_eq!(multiset(first), multiset(second));
}

async fn assert_empty_store(store: &dyn RegistrationStore) {
    assert!(store
        .list(&DepartmentFilter::Any)
        .await
        .expect("list")
        .is_empty());
    assert!(!store.exists("Nobody", "Here").await.expect("exists"));
    assert!(!store.delete("Nobody", "Here").await.expect("delete"));
}

#[tokio::test]
async fn sqlite_store_honours_contract() {
    assert_empty_store(&sqlite_store().await).await;
    assert_registration_lifecycle(&sqlite_store().await).await;
    assert_listing_is_stable(&sqlite_store().await).await;
}

#[tokio::test]
async fn memory_store_honours_contract() {
    assert_empty_store(&MemoryStore::new()).await;
    assert_registration_lifecycle(&MemoryStore::new()).await;
    assert_listing_is_stable(&MemoryStore::new()).await;
}

#[tokio::test]
async fn csv_store_honours_contract() {
    let (_dir, store) = csv_store();
    assert_empty_store(&store).await;
    let (_dir, store) = csv_store();
    assert_registration_lifecycle(&store).await;
    let (_dir, store) = csv_store();
    assert_listing_is_stable(&store).await;
}

#[tokio::test]
async fn department_filter_selects_exact_subset() {
    let sqlite = sqlite_store().await;
    let memory = MemoryStore::new();
    let stores: [&dyn RegistrationStore; 2] = [&sqlite, &memory];

    for store in stores {
        store
            .add("Ada", "Lovelace", Some("Engineering"))
            .await
            .expect("add");
        store.add("Grace", "Hopper", Some("Engineering")).await.expect("add");
        store.add("Joan", "Clarke", Some("Intelligence")).await.expect("add");

        let engineering = store
            .list(&DepartmentFilter::Only("Engineering".into()))
            .await
            .expect("list");
        assert_eq!(
            multiset(engineering),
            multiset(vec![
                "Ada Lovelace (Engineering)".to_string(),
                "Grace Hopper (Engineering)".to_string(),
            ])
        );

        let sales = store
            .list(&DepartmentFilter::Only("Sales".into()))
            .await
            .expect("list");
        assert!(sales.is_empty());

        let everyone = store.list(&DepartmentFilter::Any).await.expect("list");
        assert_eq!(everyone.len(), 3);
        assert!(everyone.contains(&"Joan Clarke (Intelligence)".to_string()));
    }
}

#[tokio::test]
async fn concurrent_adds_of_same_key_insert_once() {
    let db_dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        db_dir
            .path()
            .join("people.db")
            .to_string_lossy()
            .replace('\\', "/")
    );
    let sqlite = std::sync::Arc::new(SqliteStore::new(&database_url).await.expect("db"));
    let (_dir, csv) = csv_store();
    let csv = std::sync::Arc::new(csv);
    let memory = std::sync::Arc::new(MemoryStore::new());
    let stores: Vec<std::sync::Arc<dyn RegistrationStore>> = vec![sqlite, csv, memory];

    for store in stores {
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .add("Ada", "Lovelace", Some("Engineering"))
                    .await
                    .expect("add")
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.expect("join") {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(
            store
                .list(&DepartmentFilter::Any)
                .await
                .expect("list")
                .len(),
            1
        );
    }
}
