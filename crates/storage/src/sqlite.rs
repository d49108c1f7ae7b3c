use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::{DepartmentFilter, Person};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};

use crate::{ensure_sqlite_parent_dir_exists, RegistrationStore};

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply people migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

fn person_from_row(row: SqliteRow) -> Person {
    Person {
        name: row.get::<String, _>(0),
        surname: row.get::<String, _>(1),
        department: row.get::<Option<String>, _>(2),
    }
}

#[async_trait]
impl RegistrationStore for SqliteStore {
    async fn exists(&self, name: &str, surname: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM people WHERE name = ? AND surname = ? LIMIT 1")
            .bind(name)
            .bind(surname)
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up person")?;
        Ok(row.is_some())
    }

    async fn add(&self, name: &str, surname: &str, department: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO people (name, surname, department) VALUES (?, ?, ?)
             ON CONFLICT(name, surname) DO NOTHING",
        )
        .bind(name)
        .bind(surname)
        .bind(department)
        .execute(&self.pool)
        .await
        .context("failed to insert person")?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, name: &str, surname: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM people WHERE name = ? AND surname = ?")
            .bind(name)
            .bind(surname)
            .execute(&self.pool)
            .await
            .context("failed to delete person")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_people(&self, filter: &DepartmentFilter) -> Result<Vec<Person>> {
        let rows = match filter.as_department() {
            None => {
                sqlx::query("SELECT name, surname, department FROM people ORDER BY rowid")
                    .fetch_all(&self.pool)
                    .await
            }
            Some(department) => {
                sqlx::query(
                    "SELECT name, surname, department FROM people
                     WHERE department = ?
                     ORDER BY rowid",
                )
                .bind(department)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("failed to list people")?;

        Ok(rows.into_iter().map(person_from_row).collect())
    }

    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}
