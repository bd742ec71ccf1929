//! Turns a noisy listing into at most one "new post" decision per account.

use post_source::PostSource;
use postrelay_core::{
    extract_id, is_newer, AccountConfig, CandidateFilter, Clock, CoreError, Decision, Discovered,
    DiscoveryPhase, FilterInput, QueryDateRange, SequenceId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A profile shows at most one pinned post above its timeline.
const MAX_PINNED_POSTS: usize = 1;

#[derive(Debug)]
enum DiscoveryState {
    Primary,
    Fallback,
    Done(Decision),
}

pub struct DiscoveryStrategy {
    source: Arc<dyn PostSource>,
    filter: CandidateFilter,
    clock: Arc<dyn Clock>,
    recent_scan_limit: usize,
    single_post_url: Option<String>,
}

impl DiscoveryStrategy {
    pub fn new(
        source: Arc<dyn PostSource>,
        filter: CandidateFilter,
        clock: Arc<dyn Clock>,
        recent_scan_limit: usize,
    ) -> Self {
        Self {
            source,
            filter,
            clock,
            recent_scan_limit,
            single_post_url: None,
        }
    }

    /// Ask the source for exactly this post instead of querying.
    pub fn with_single_post(mut self, permalink: Option<String>) -> Self {
        self.single_post_url = permalink;
        self
    }

    pub async fn run(
        &self,
        account: &AccountConfig,
        last_seen: Option<&SequenceId>,
    ) -> Result<Decision, CoreError> {
        if let Some(permalink) = &self.single_post_url {
            return self.single_post(permalink, last_seen).await;
        }

        let input = FilterInput {
            last_seen,
            require_window: account.requires_window(),
            reference: self.clock.now(),
        };

        let mut state = DiscoveryState::Primary;
        loop {
            state = match state {
                DiscoveryState::Primary => self.primary(account, &input).await?,
                DiscoveryState::Fallback => self.fallback(account, &input).await?,
                DiscoveryState::Done(decision) => return Ok(decision),
            };
        }
    }

    async fn primary(
        &self,
        account: &AccountConfig,
        input: &FilterInput<'_>,
    ) -> Result<DiscoveryState, CoreError> {
        let keyword = account.keyword.as_deref();
        let range = QueryDateRange::utc_today(input.reference);
        let candidates = self
            .source
            .fetch_by_query(&account.target_handle, keyword, range)
            .await?;

        // Records without a permalink do not count as results.
        if candidates.iter().all(|candidate| candidate.permalink.is_none()) {
            info!(account = %account.name, "Query returned no posts, scanning recent posts");
            return Ok(DiscoveryState::Fallback);
        }

        let qualifying = self.filter.filter(&candidates, input);
        debug!(
            account = %account.name,
            returned = candidates.len(),
            qualifying = qualifying.len(),
            "Filtered query results"
        );

        let found = qualifying
            .into_iter()
            .find(|(candidate, _)| CandidateFilter::matches_keyword(candidate, keyword));

        Ok(DiscoveryState::Done(match found {
            Some((candidate, id)) => {
                info!(account = %account.name, %id, phase = %DiscoveryPhase::Primary, "Found new post");
                Decision::Found(Discovered {
                    candidate: candidate.clone(),
                    id,
                    phase: DiscoveryPhase::Primary,
                })
            }
            None => Decision::NoneFound,
        }))
    }

    async fn fallback(
        &self,
        account: &AccountConfig,
        input: &FilterInput<'_>,
    ) -> Result<DiscoveryState, CoreError> {
        let fetched = self
            .source
            .fetch_recent(
                &account.target_handle,
                self.recent_scan_limit + MAX_PINNED_POSTS,
            )
            .await?;

        // The cap counts timeline posts only, so pinned posts go first.
        let candidates: Vec<_> = fetched
            .into_iter()
            .filter(|candidate| !self.filter.is_pinned(candidate))
            .take(self.recent_scan_limit)
            .collect();
        debug!(account = %account.name, scanned = candidates.len(), "Scanning recent posts");

        Ok(DiscoveryState::Done(
            match self.filter.scan_until_seen(&candidates, input) {
                Some((candidate, id)) => {
                    info!(account = %account.name, %id, phase = %DiscoveryPhase::Fallback, "Found new post");
                    Decision::Found(Discovered {
                        candidate: candidate.clone(),
                        id,
                        phase: DiscoveryPhase::Fallback,
                    })
                }
                None => Decision::NoneFound,
            },
        ))
    }

    async fn single_post(
        &self,
        permalink: &str,
        last_seen: Option<&SequenceId>,
    ) -> Result<Decision, CoreError> {
        info!(permalink, "Fetching single configured post");
        let Some(candidate) = self.source.fetch_post(permalink).await? else {
            warn!(permalink, "Configured post not found");
            return Ok(Decision::NoneFound);
        };

        let Some(id) = extract_id(candidate.permalink.as_deref()) else {
            warn!(permalink, "Configured post has no usable permalink");
            return Ok(Decision::NoneFound);
        };

        if !is_newer(&id, last_seen) {
            info!(%id, "Configured post already processed");
            return Ok(Decision::NoneFound);
        }

        Ok(Decision::Found(Discovered {
            candidate,
            id,
            phase: DiscoveryPhase::SinglePost,
        }))
    }
}
