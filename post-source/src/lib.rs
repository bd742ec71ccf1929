//! Retrieval of candidate posts from the rendering collaborator.
//!
//! The engine only ever talks to a [`PostSource`]. Two implementations ship
//! here: [`BrowserlessSource`], which drives a remote headless browser, and
//! [`FixtureSource`], which replays canned listings from a JSON file.

pub mod browserless;
pub mod fixture;

pub use browserless::{BrowserlessConfig, BrowserlessSource};
pub use fixture::{FixtureAccount, FixtureListing, FixtureSource};

use async_trait::async_trait;
use postrelay_core::{Candidate, CoreError, QueryDateRange, SourceConfig};
use std::sync::Arc;

#[async_trait]
pub trait PostSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the session can be trusted to return complete listings
    /// (e.g. it is logged in). Checked once before a run.
    async fn session_ready(&self) -> Result<bool, CoreError> {
        Ok(true)
    }

    /// Time-boxed listing for `handle`, in the site's own order.
    async fn fetch_by_query(
        &self,
        handle: &str,
        keyword: Option<&str>,
        range: QueryDateRange,
    ) -> Result<Vec<Candidate>, CoreError>;

    /// Most recent posts on the account's timeline, newest first, at most
    /// `max_count` of them.
    async fn fetch_recent(&self, handle: &str, max_count: usize)
        -> Result<Vec<Candidate>, CoreError>;

    /// Exactly one post, addressed by permalink.
    async fn fetch_post(&self, permalink: &str) -> Result<Option<Candidate>, CoreError>;
}

/// Search expression for the primary query. The keyword part is left out
/// when no keyword is configured.
pub fn search_query(handle: &str, keyword: Option<&str>, range: QueryDateRange) -> String {
    let mut query = format!("from:{}", handle);
    if let Some(keyword) = keyword {
        query.push(' ');
        query.push_str(keyword);
    }
    query.push_str(&format!(" since:{} until:{}", range.since, range.until));
    query
}

/// Build the configured source.
pub async fn from_config(config: &SourceConfig) -> Result<Arc<dyn PostSource>, CoreError> {
    match config {
        SourceConfig::Browserless {
            base_url,
            token,
            site_origin,
            settle_millis,
            request_timeout_secs,
        } => {
            let source = BrowserlessSource::new(BrowserlessConfig {
                base_url: base_url.clone(),
                token: token.clone(),
                site_origin: site_origin.clone(),
                settle_millis: *settle_millis,
                request_timeout: std::time::Duration::from_secs(*request_timeout_secs),
            })?;
            Ok(Arc::new(source))
        }
        SourceConfig::Fixture { path } => Ok(Arc::new(FixtureSource::from_path(path).await?)),
    }
}

#[cfg(test)]
mod tests;
