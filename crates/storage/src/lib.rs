use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use shared::domain::{DepartmentFilter, Person};

mod csv_file;
mod memory;
mod sqlite;

pub use csv_file::CsvStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persisted set of registrants keyed by `(name, surname)`.
///
/// Keys compare exactly and case-sensitively. A backing medium that does not
/// exist yet behaves like an empty store; I/O faults are returned as errors.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn exists(&self, name: &str, surname: &str) -> Result<bool>;

    /// Inserts the person unless the key is taken. Returns `false` without
    /// touching the stored record when it is.
    async fn add(&self, name: &str, surname: &str, department: Option<&str>) -> Result<bool>;

    /// Removes the key. Returns `false` when nothing was stored under it.
    async fn delete(&self, name: &str, surname: &str) -> Result<bool>;

    /// Records matching the filter in storage order.
    async fn list_people(&self, filter: &DepartmentFilter) -> Result<Vec<Person>>;

    async fn health_check(&self) -> Result<()>;

    /// Display strings of the records matching the filter.
    async fn list(&self, filter: &DepartmentFilter) -> Result<Vec<String>> {
        Ok(self
            .list_people(filter)
            .await?
            .iter()
            .map(Person::display_name)
            .collect())
    }
}

pub type SharedStore = Arc<dyn RegistrationStore>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Csv,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Csv => "csv",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sql" => Ok(Self::Sqlite),
            "csv" => Ok(Self::Csv),
            "memory" | "mem" => Ok(Self::Memory),
            other => bail!("unknown store backend '{other}'; expected sqlite, csv or memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: String,
    pub csv_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: "sqlite://./data/database.db".into(),
            csv_path: PathBuf::from("./data/names.csv"),
        }
    }
}

pub async fn open_store(config: &StoreConfig) -> Result<SharedStore> {
    let store: SharedStore = match config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(&config.database_url).await?),
        StoreBackend::Csv => Arc::new(CsvStore::new(&config.csv_path)),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Filesystem path behind a `sqlite:` URL; `None` for in-memory and non-sqlite URLs.
pub fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

/// Creates the directory that will hold a file-backed sqlite database.
pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
