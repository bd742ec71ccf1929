use crate::discovery::DiscoveryStrategy;
use crate::report::{AccountOutcome, RunReport};
use cursor_store::CursorStore;
use postrelay_core::{AccountConfig, Decision, ErrorExt};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use webhook_notifier::Notifier;

/// Processes accounts one after another against the shared collaborators.
pub struct RunCoordinator {
    discovery: DiscoveryStrategy,
    store: Arc<dyn CursorStore>,
    notifier: Arc<dyn Notifier>,
}

impl RunCoordinator {
    pub fn new(
        discovery: DiscoveryStrategy,
        store: Arc<dyn CursorStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            discovery,
            store,
            notifier,
        }
    }

    /// One pass over every account, in configuration order. Failures stay
    /// with the account they happened on.
    pub async fn run(&self, accounts: &[AccountConfig]) -> RunReport {
        let mut report = RunReport::default();
        for account in accounts {
            let span = info_span!("account", account = %account.name, cursor_key = %account.cursor_key);
            let outcome = self.process_account(account).instrument(span).await;
            report.outcomes.push((account.name.clone(), outcome));
        }
        report
    }

    pub async fn process_account(&self, account: &AccountConfig) -> AccountOutcome {
        info!(target_handle = %account.target_handle, "Processing account");

        let Some(target) = &account.notify_target else {
            warn!("Notification target not set, skipping");
            return AccountOutcome::Disabled;
        };

        let last_seen = match self.store.load(&account.cursor_key).await {
            Ok(last_seen) => last_seen,
            Err(e) => {
                e.log_error();
                return AccountOutcome::CursorReadFailed {
                    error_code: e.error_code(),
                };
            }
        };
        match &last_seen {
            Some(id) => info!(last_seen = %id, "Loaded cursor"),
            None => info!("No stored cursor"),
        }

        let discovered = match self.discovery.run(account, last_seen.as_ref()).await {
            Ok(Decision::Found(discovered)) => discovered,
            Ok(Decision::NoneFound) => {
                info!("No new post found");
                return AccountOutcome::NothingNew;
            }
            Err(e) => {
                e.log_error();
                return AccountOutcome::RetrievalFailed {
                    error_code: e.error_code(),
                };
            }
        };

        let id = discovered.id.clone();
        if let Err(e) = self.notifier.deliver(target, discovered.permalink()).await {
            // Not fatal: the cursor stays put and the post is retried next pass.
            e.log_warn();
            warn!(reason = %e.user_friendly_message(), "Delivery failed");
            return AccountOutcome::DeliveryFailed {
                id,
                error_code: e.error_code(),
            };
        }

        if let Err(e) = self.store.save(&account.cursor_key, &id).await {
            e.log_error();
            return AccountOutcome::CursorWriteFailed {
                id,
                error_code: e.error_code(),
            };
        }

        info!(%id, phase = %discovered.phase, notifier = self.notifier.name(), "Relayed and saved cursor");
        AccountOutcome::Delivered { id }
    }
}
