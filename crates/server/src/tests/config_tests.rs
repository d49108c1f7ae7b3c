use super::{load_settings_from, normalize_database_url, prepare_database_url, Settings};

use std::collections::HashMap;

use storage::StoreBackend;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn empty_database_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn keeps_memory_and_foreign_urls() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("sqlite://./data/people.db"),
        "sqlite://./data/people.db"
    );
}

#[test]
fn keeps_windows_absolute_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn normalizes_windows_plain_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("C:\\Users\\alice\\test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn converts_sqlite_double_slash_windows_path() {
    assert_eq!(
        normalize_database_url("sqlite://C:/Users/alice/test.db"),
        "sqlite:C:/Users/alice/test.db"
    );
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[test]
fn memory_url_is_prepared_without_touching_disk() {
    assert_eq!(
        prepare_database_url("sqlite::memory:").expect("prepare"),
        "sqlite::memory:"
    );
    assert!(!std::path::Path::new(":memory:").exists());
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let store = storage::SqliteStore::new(&prepared)
        .await
        .expect("open sqlite");
    drop(store);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, env_from(&[]));
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.store_backend, StoreBackend::Sqlite);
    assert_eq!(
        settings.departments,
        vec!["Sales", "Marketing", "Engineering", "Intelligence", "Finance"]
    );
}

#[test]
fn file_values_are_overridden_by_env() {
    let file = r#"
        bind_addr = "0.0.0.0:9000"
        database_url = "sqlite://./file.db"
        store_backend = "csv"
        csv_path = "./file.csv"
        departments = "Sales, Finance"
    "#;
    let settings = load_settings_from(
        Some(file),
        env_from(&[
            ("APP__BIND_ADDR", "127.0.0.1:9999"),
            ("APP__CSV_PATH", "./env.csv"),
        ]),
    );

    assert_eq!(settings.server_bind, "127.0.0.1:9999");
    assert_eq!(settings.database_url, "sqlite://./file.db");
    assert_eq!(settings.store_backend, StoreBackend::Csv);
    assert_eq!(settings.csv_path, std::path::PathBuf::from("./env.csv"));
    assert_eq!(settings.departments, vec!["Sales", "Finance"]);
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let settings = load_settings_from(
        None,
        env_from(&[
            ("DATABASE_URL", "sqlite://./plain.db"),
            ("APP__DATABASE_URL", "sqlite://./prefixed.db"),
            ("APP__STORE_BACKEND", "memory"),
        ]),
    );
    assert_eq!(settings.database_url, "sqlite://./prefixed.db");
    assert_eq!(settings.store_backend, StoreBackend::Memory);
}

#[test]
fn invalid_backend_keeps_previous_choice() {
    let settings = load_settings_from(None, env_from(&[("APP__STORE_BACKEND", "oracle")]));
    assert_eq!(settings.store_backend, StoreBackend::Sqlite);
}

#[test]
fn csv_store_config_passes_path_through() {
    let settings = load_settings_from(
        None,
        env_from(&[
            ("APP__STORE_BACKEND", "csv"),
            ("APP__CSV_PATH", "./people.csv"),
        ]),
    );
    let config = settings.store_config().expect("store config");
    assert_eq!(config.backend, StoreBackend::Csv);
    assert_eq!(config.csv_path, std::path::PathBuf::from("./people.csv"));
}
