use crate::coordinator::RunCoordinator;
use crate::discovery::DiscoveryStrategy;
use crate::report::RunReport;
use cursor_store::CursorStore;
use post_source::PostSource;
use postrelay_core::{AccountConfig, AppConfig, Clock, CoreError, ErrorExt, SourceError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use webhook_notifier::Notifier;

pub struct RelayService {
    source: Arc<dyn PostSource>,
    coordinator: RunCoordinator,
    accounts: Vec<AccountConfig>,
    polling_interval: Duration,
}

impl RelayService {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn PostSource>,
        store: Arc<dyn CursorStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let discovery = DiscoveryStrategy::new(
            source.clone(),
            config.candidate_filter(),
            clock,
            config.service.recent_scan_limit,
        )
        .with_single_post(config.overrides.single_post_url.clone());

        Self {
            source,
            coordinator: RunCoordinator::new(discovery, store, notifier),
            accounts: config.accounts.clone(),
            polling_interval: Duration::from_secs(config.service.polling_interval_minutes * 60),
        }
    }

    pub fn with_polling_interval(mut self, polling_interval: Duration) -> Self {
        self.polling_interval = polling_interval;
        self
    }

    /// One pass over all accounts, preceded by the session check.
    pub async fn run_once(&self) -> RunReport {
        info!(source = self.source.name(), accounts = self.accounts.len(), "Starting pass");

        // Listings from a session that is not logged in are incomplete and
        // would re-relay old posts.
        let preflight = match self.source.session_ready().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(CoreError::from(SourceError::SessionUnavailable {
                reason: "not logged in".to_string(),
            })),
            Err(e) => Err(e),
        };
        if let Err(e) = preflight {
            e.log_error();
            error!(error_code = %e.error_code(), "Session check failed, aborting pass");
            return RunReport::aborted(e.user_friendly_message());
        }

        let report = self.coordinator.run(&self.accounts).await;
        info!(
            delivered = report.delivered_count(),
            failed = report.failure_count(),
            "Pass finished"
        );
        report
    }

    /// Repeat passes until Ctrl-C.
    pub async fn watch(&self) {
        self.watch_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C, stopping: {}", e);
            }
        })
        .await
    }

    /// Repeat passes every polling interval until `shutdown` completes. A pass
    /// in progress always finishes first, and passes never overlap.
    pub async fn watch_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(interval_secs = self.polling_interval.as_secs(), "Watching accounts");
        let mut interval = tokio::time::interval(self.polling_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.run_once().await;
                    if let Some(reason) = &report.aborted {
                        warn!(reason = %reason, "Pass aborted");
                    }
                }
            }
        }
    }
}
