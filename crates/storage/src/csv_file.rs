use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use shared::domain::{DepartmentFilter, Person};
use tokio::{fs, sync::Mutex};

use crate::RegistrationStore;

#[derive(Debug, Clone, Deserialize)]
struct CsvRow {
    name: String,
    surname: String,
}

/// Key-only registrant file with a `name,surname` header.
///
/// Departments are not persisted, so every listed person has none and a
/// department filter other than `Any` yields nothing.
pub struct CsvStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows(&self) -> Result<Vec<CsvRow>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read '{}'", self.path.display()))
            }
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut rows = Vec::new();
        for record in reader.deserialize::<CsvRow>() {
            let row = record
                .with_context(|| format!("malformed row in '{}'", self.path.display()))?;
            rows.push(row);
        }
        Ok(rows)
    }

    async fn rewrite(&self, rows: &[CsvRow]) -> Result<()> {
        let mut bytes = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut bytes);
            // Header must be present even when the roster becomes empty.
            writer.write_record(["name", "surname"])?;
            for row in rows {
                writer.write_record([row.name.as_str(), row.surname.as_str()])?;
            }
            writer.flush()?;
        }

        ensure_parent_dir_exists(&self.path).await?;
        let temp_path = temp_sibling(&self.path);
        fs::write(&temp_path, &bytes)
            .await
            .with_context(|| format!("failed to write '{}'", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("failed to replace '{}'", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for CsvStore {
    async fn exists(&self, name: &str, surname: &str) -> Result<bool> {
        Ok(self
            .read_rows()
            .await?
            .iter()
            .any(|row| row.name == name && row.surname == surname))
    }

    async fn add(&self, name: &str, surname: &str, _department: Option<&str>) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read_rows().await?;
        if rows.iter().any(|row| row.name == name && row.surname == surname) {
            return Ok(false);
        }
        rows.push(CsvRow {
            name: name.to_string(),
            surname: surname.to_string(),
        });
        self.rewrite(&rows).await?;
        Ok(true)
    }

    async fn delete(&self, name: &str, surname: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.read_rows().await?;
        let before = rows.len();
        rows.retain(|row| !(row.name == name && row.surname == surname));
        if rows.len() == before {
            return Ok(false);
        }
        self.rewrite(&rows).await?;
        Ok(true)
    }

    async fn list_people(&self, filter: &DepartmentFilter) -> Result<Vec<Person>> {
        Ok(self
            .read_rows()
            .await?
            .into_iter()
            .map(|row| Person::new(row.name, row.surname, None))
            .filter(|person| filter.matches(person.department.as_deref()))
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        self.read_rows().await.map(|_| ())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".tmp");
    PathBuf::from(raw)
}

async fn ensure_parent_dir_exists(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).await.with_context(|| {
        format!(
            "failed to create parent directory '{}' for csv file",
            parent.display()
        )
    })?;
    Ok(())
}
