use crate::PostSource;
use async_trait::async_trait;
use postrelay_core::{Candidate, CoreError, QueryDateRange, SourceError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Canned listings for one handle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixtureAccount {
    pub query: Vec<Candidate>,
    pub recent: Vec<Candidate>,
}

/// On-disk fixture format:
///
/// ```json
/// {
///   "session_ready": true,
///   "accounts": { "someone": { "query": [...], "recent": [...] } },
///   "posts": { "https://x.com/someone/status/1": { "link": "...", "text": "..." } }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureListing {
    #[serde(default = "default_session_ready")]
    pub session_ready: bool,
    #[serde(default)]
    pub accounts: HashMap<String, FixtureAccount>,
    #[serde(default)]
    pub posts: HashMap<String, Candidate>,
}

impl Default for FixtureListing {
    fn default() -> Self {
        Self {
            session_ready: true,
            accounts: HashMap::new(),
            posts: HashMap::new(),
        }
    }
}

fn default_session_ready() -> bool {
    true
}

/// Serves listings from a fixture instead of a live browser session.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    listing: FixtureListing,
}

impl FixtureSource {
    pub fn new(listing: FixtureListing) -> Self {
        Self { listing }
    }

    pub async fn from_path(path: &Path) -> Result<Self, CoreError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            debug!("Fixture read failed: {}", e);
            SourceError::FixtureUnavailable {
                path: path.display().to_string(),
            }
        })?;
        let listing: FixtureListing =
            serde_json::from_str(&contents).map_err(|e| SourceError::InvalidResponse {
                details: format!("fixture {}: {}", path.display(), e),
            })?;
        info!(
            path = %path.display(),
            accounts = listing.accounts.len(),
            "Loaded fixture listings"
        );
        Ok(Self::new(listing))
    }

    fn account(&self, handle: &str) -> Option<&FixtureAccount> {
        self.listing.accounts.get(handle)
    }
}

#[async_trait]
impl PostSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn session_ready(&self) -> Result<bool, CoreError> {
        Ok(self.listing.session_ready)
    }

    async fn fetch_by_query(
        &self,
        handle: &str,
        _keyword: Option<&str>,
        _range: QueryDateRange,
    ) -> Result<Vec<Candidate>, CoreError> {
        Ok(self
            .account(handle)
            .map(|account| account.query.clone())
            .unwrap_or_default())
    }

    async fn fetch_recent(
        &self,
        handle: &str,
        max_count: usize,
    ) -> Result<Vec<Candidate>, CoreError> {
        Ok(self
            .account(handle)
            .map(|account| account.recent.iter().take(max_count).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_post(&self, permalink: &str) -> Result<Option<Candidate>, CoreError> {
        Ok(self.listing.posts.get(permalink).cloned())
    }
}
