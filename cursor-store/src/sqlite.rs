use crate::{check_key, CursorStore};
use async_trait::async_trait;
use chrono::Utc;
use postrelay_core::{CoreError, SequenceId, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

const CREATE_CURSORS_TABLE: &str = "CREATE TABLE IF NOT EXISTS cursors (
    cursor_key TEXT PRIMARY KEY NOT NULL,
    last_seen_id TEXT,
    updated_at TEXT NOT NULL
)";

/// Cursor table in an SQLite database, one row per account.
#[derive(Debug, Clone)]
pub struct SqliteCursorStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteCursorStore {
    pub async fn connect(connection_string: &str) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str(connection_string)
            .map_err(|e| StoreError::ConnectionFailed {
                reason: e.to_string(),
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        if let Some(parent) = database_dir(connection_string) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Runs are sequential; a single connection keeps `:memory:` databases
        // shared across calls as well.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        debug!("Connected to cursor database");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        sqlx::query(CREATE_CURSORS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed {
                migration: format!("create cursors table: {}", e),
            })?;
        Ok(())
    }
}

/// Directory part of a file-backed `sqlite://` URL, if any.
fn database_dir(connection_string: &str) -> Option<&Path> {
    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

#[async_trait]
impl CursorStore for SqliteCursorStore {
    async fn load(&self, cursor_key: &str) -> Result<Option<SequenceId>, CoreError> {
        check_key(cursor_key)?;
        let row = sqlx::query("SELECT last_seen_id FROM cursors WHERE cursor_key = ?1")
            .bind(cursor_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let Some(row) = row else {
            debug!(cursor_key, "No cursor row yet");
            return Ok(None);
        };

        let raw = match row.try_get::<Option<String>, _>("last_seen_id") {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cursor_key, "Cursor row unreadable, treating as unset: {}", e);
                return Ok(None);
            }
        };

        Ok(raw.and_then(|raw| {
            let id = SequenceId::parse(&raw);
            if id.is_none() {
                warn!(cursor_key, value = %raw, "Stored cursor is not an id, treating as unset");
            }
            id
        }))
    }

    async fn save(&self, cursor_key: &str, id: &SequenceId) -> Result<(), CoreError> {
        check_key(cursor_key)?;
        sqlx::query(
            "INSERT INTO cursors (cursor_key, last_seen_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(cursor_key) DO UPDATE SET
                 last_seen_id = excluded.last_seen_id,
                 updated_at = excluded.updated_at",
        )
        .bind(cursor_key)
        .bind(id.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::WriteFailed {
            key: cursor_key.to_string(),
            reason: e.to_string(),
        })?;

        info!(cursor_key, %id, "Saved cursor");
        Ok(())
    }
}
