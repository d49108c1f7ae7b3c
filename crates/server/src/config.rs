use std::{collections::HashMap, fs, path::PathBuf};

use serde::Deserialize;
use shared::domain::default_departments;
use storage::{ensure_sqlite_parent_dir_exists, StoreBackend, StoreConfig};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    #[serde(skip)]
    pub store_backend: StoreBackend,
    pub csv_path: PathBuf,
    pub departments: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/database.db".into(),
            store_backend: StoreBackend::Sqlite,
            csv_path: PathBuf::from("./data/names.csv"),
            departments: default_departments(),
        }
    }
}

impl Settings {
    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let database_url = match self.store_backend {
            StoreBackend::Sqlite => prepare_database_url(&self.database_url)?,
            _ => self.database_url.clone(),
        };
        Ok(StoreConfig {
            backend: self.store_backend,
            database_url,
            csv_path: self.csv_path.clone(),
        })
    }
}

pub fn load_settings() -> Settings {
    let file_raw = fs::read_to_string("server.toml").ok();
    load_settings_from(file_raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml` keys, then environment variables; later sources win.
pub fn load_settings_from(
    file_raw: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_raw {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("database_url") {
                    settings.database_url = v.clone();
                }
                if let Some(v) = file_cfg.get("store_backend") {
                    apply_backend(&mut settings, v);
                }
                if let Some(v) = file_cfg.get("csv_path") {
                    settings.csv_path = PathBuf::from(v);
                }
                if let Some(v) = file_cfg.get("departments") {
                    apply_departments(&mut settings, v);
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__STORE_BACKEND") {
        apply_backend(&mut settings, &v);
    }

    if let Some(v) = env("APP__CSV_PATH") {
        settings.csv_path = PathBuf::from(v);
    }

    if let Some(v) = env("APP__DEPARTMENTS") {
        apply_departments(&mut settings, &v);
    }

    settings
}

fn apply_backend(settings: &mut Settings, raw: &str) {
    match raw.parse::<StoreBackend>() {
        Ok(backend) => settings.store_backend = backend,
        Err(error) => warn!(%error, "keeping store backend {}", settings.store_backend),
    }
}

fn apply_departments(settings: &mut Settings, raw: &str) {
    let departments: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|department| !department.is_empty())
        .map(str::to_string)
        .collect();
    if !departments.is_empty() {
        settings.departments = departments;
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if has_windows_drive(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if has_windows_drive(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn has_windows_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
