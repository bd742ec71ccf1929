use crate::{check_key, CursorStore};
use async_trait::async_trait;
use postrelay_core::{CoreError, SequenceId, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// On-disk shape. The id is a string because it does not fit a JSON number.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorRecord {
    last_seen_id: Option<String>,
}

/// One `<cursor_key>.json` file per account under `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileCursorStore {
    dir: PathBuf,
}

impl JsonFileCursorStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, cursor_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cursor_key))
    }

    fn write_error(cursor_key: &str, err: impl std::fmt::Display) -> CoreError {
        StoreError::WriteFailed {
            key: cursor_key.to_string(),
            reason: err.to_string(),
        }
        .into()
    }

    async fn write_durably(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await?;
        sync_parent(path).await
    }
}

/// Persist the rename itself.
#[cfg(unix)]
async fn sync_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::File::open(parent).await?.sync_all().await
        }
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl CursorStore for JsonFileCursorStore {
    async fn load(&self, cursor_key: &str) -> Result<Option<SequenceId>, CoreError> {
        check_key(cursor_key)?;
        let path = self.path_for(cursor_key);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(cursor_key, "No cursor file yet");
                return Ok(None);
            }
            Err(e) => {
                warn!(cursor_key, path = %path.display(), "Cursor file unreadable, treating as unset: {}", e);
                return Ok(None);
            }
        };

        let record: CursorRecord = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                warn!(cursor_key, path = %path.display(), "Cursor file corrupt, treating as unset: {}", e);
                return Ok(None);
            }
        };

        Ok(record.last_seen_id.and_then(|raw| {
            let id = SequenceId::parse(&raw);
            if id.is_none() {
                warn!(cursor_key, value = %raw, "Stored cursor is not an id, treating as unset");
            }
            id
        }))
    }

    async fn save(&self, cursor_key: &str, id: &SequenceId) -> Result<(), CoreError> {
        check_key(cursor_key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::write_error(cursor_key, e))?;

        let record = CursorRecord {
            last_seen_id: Some(id.to_string()),
        };
        let contents = serde_json::to_vec_pretty(&record)?;
        let path = self.path_for(cursor_key);
        Self::write_durably(&path, &contents)
            .await
            .map_err(|e| Self::write_error(cursor_key, e))?;

        info!(cursor_key, %id, "Saved cursor");
        Ok(())
    }
}
