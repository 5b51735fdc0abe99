use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared::domain::RegistrationId;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Registration as accepted by the handler, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub full_name: String,
    pub whatsapp_number: String,
    pub email: String,
    pub interest: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRecord {
    pub id: RegistrationId,
    pub full_name: String,
    pub whatsapp_number: String,
    pub email: String,
    pub interest: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database url is not configured")]
    MissingDatabaseUrl,
    #[error("failed to open registration store: {0}")]
    Connect(#[source] anyhow::Error),
    #[error("failed to write registration: {0}")]
    Write(#[source] anyhow::Error),
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> Result<RegistrationRecord> {
        let record = RegistrationRecord {
            id: RegistrationId::new_v4(),
            full_name: registration.full_name.clone(),
            whatsapp_number: registration.whatsapp_number.clone(),
            email: registration.email.clone(),
            interest: registration.interest.clone(),
            message: registration.message.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO registrations (id, full_name, whatsapp_number, email, interest, message, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.0.to_string())
        .bind(&record.full_name)
        .bind(&record.whatsapp_number)
        .bind(&record.email)
        .bind(&record.interest)
        .bind(record.message.as_deref())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("failed to insert registration")?;

        Ok(record)
    }

    pub async fn load_registration(
        &self,
        id: RegistrationId,
    ) -> Result<Option<RegistrationRecord>> {
        let row = sqlx::query(
            "SELECT id, full_name, whatsapp_number, email, interest, message, created_at
             FROM registrations WHERE id = ?",
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(registration_from_row).transpose()
    }

    /// Most recent registrations first.
    pub async fn list_registrations(&self, limit: u32) -> Result<Vec<RegistrationRecord>> {
        let rows = sqlx::query(
            "SELECT id, full_name, whatsapp_number, email, interest, message, created_at
             FROM registrations
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(registration_from_row).collect()
    }

    pub async fn count_registrations(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn registration_from_row(row: &SqliteRow) -> Result<RegistrationRecord> {
    let raw_id = row.get::<String, _>(0);
    let id = Uuid::parse_str(&raw_id)
        .with_context(|| format!("stored registration id '{raw_id}' is not a uuid"))?;
    Ok(RegistrationRecord {
        id: RegistrationId(id),
        full_name: row.get::<String, _>(1),
        whatsapp_number: row.get::<String, _>(2),
        email: row.get::<String, _>(3),
        interest: row.get::<String, _>(4),
        message: row.get::<Option<String>, _>(5),
        created_at: row.get::<DateTime<Utc>, _>(6),
    })
}

/// Write side of the registration store as seen by the handler.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> std::result::Result<RegistrationRecord, StorageError>;
}

#[async_trait]
impl RegistrationStore for Storage {
    async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> std::result::Result<RegistrationRecord, StorageError> {
        Storage::insert_registration(self, registration)
            .await
            .map_err(StorageError::Write)
    }
}

/// Process-scoped owner of the store handle.
///
/// The handle is opened on first use, health-checked before every reuse and
/// reopened when the check fails. A missing database url surfaces here, on
/// the first request that needs the store, not at startup.
pub struct StorageManager {
    database_url: Option<String>,
    handle: Mutex<Option<Storage>>,
}

impl StorageManager {
    pub fn new(database_url: Option<String>) -> Self {
        Self {
            database_url: database_url.filter(|url| !url.trim().is_empty()),
            handle: Mutex::new(None),
        }
    }

    /// Manager seeded with an already open handle.
    pub fn with_storage(database_url: Option<String>, storage: Storage) -> Self {
        let manager = Self::new(database_url);
        Self {
            handle: Mutex::new(Some(storage)),
            ..manager
        }
    }

    pub async fn acquire(&self) -> std::result::Result<Storage, StorageError> {
        let mut handle = self.handle.lock().await;

        if let Some(storage) = handle.as_ref() {
            match storage.health_check().await {
                Ok(()) => return Ok(storage.clone()),
                Err(error) => {
                    warn!(%error, "cached store handle failed health check; reopening");
                    *handle = None;
                }
            }
        }

        let database_url = self
            .database_url
            .as_deref()
            .ok_or(StorageError::MissingDatabaseUrl)?;
        let storage = Storage::new(database_url).await.map_err(|error| {
            error!(%error, "failed to open registration store");
            StorageError::Connect(error)
        })?;
        info!("registration store connected");
        *handle = Some(storage.clone());
        Ok(storage)
    }

    pub async fn shutdown(&self) {
        if let Some(storage) = self.handle.lock().await.take() {
            storage.close().await;
        }
    }
}

#[async_trait]
impl RegistrationStore for StorageManager {
    async fn insert_registration(
        &self,
        registration: &NewRegistration,
    ) -> std::result::Result<RegistrationRecord, StorageError> {
        let storage = self.acquire().await?;
        RegistrationStore::insert_registration(&storage, registration).await
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
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

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
