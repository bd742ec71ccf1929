//! Durable per-account cursors: the last post id relayed for each account.
//!
//! `load` treats a missing or unparseable record as "never processed".
//! That can cause one duplicate relay after corruption, but never blocks an
//! account. `save` is durable by the time it returns.

pub mod json_file;
pub mod sqlite;

pub use json_file::JsonFileCursorStore;
pub use sqlite::SqliteCursorStore;

use async_trait::async_trait;
use postrelay_core::{validate_cursor_key, CoreError, SequenceId, StoreConfig, StoreError};
use std::sync::Arc;

#[async_trait]
pub trait CursorStore: Send + Sync {
    /// `Ok(None)` for a missing or corrupt record. Errors are reserved for a
    /// backend that cannot be reached at all.
    async fn load(&self, cursor_key: &str) -> Result<Option<SequenceId>, CoreError>;

    async fn save(&self, cursor_key: &str, id: &SequenceId) -> Result<(), CoreError>;
}

pub(crate) fn check_key(cursor_key: &str) -> Result<(), CoreError> {
    validate_cursor_key(cursor_key).map_err(|_| {
        CoreError::from(StoreError::InvalidKey {
            key: cursor_key.to_string(),
        })
    })
}

pub async fn from_config(config: &StoreConfig) -> Result<Arc<dyn CursorStore>, CoreError> {
    match config {
        StoreConfig::Json { dir } => Ok(Arc::new(JsonFileCursorStore::new(dir.clone()))),
        StoreConfig::Sqlite { url } => {
            let store = SqliteCursorStore::connect(url).await?;
            store.run_migrations().await?;
            Ok(Arc::new(store))
        }
    }
}
