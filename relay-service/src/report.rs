use postrelay_core::SequenceId;
use std::fmt;

/// What happened to one account during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// No notification target configured.
    Disabled,
    NothingNew,
    Delivered { id: SequenceId },
    CursorReadFailed { error_code: String },
    RetrievalFailed { error_code: String },
    /// The cursor was left untouched, so the post is retried next pass.
    DeliveryFailed { id: SequenceId, error_code: String },
    /// Delivered, but the cursor did not advance. The post will be relayed again.
    CursorWriteFailed { id: SequenceId, error_code: String },
}

impl AccountOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AccountOutcome::CursorReadFailed { .. }
                | AccountOutcome::RetrievalFailed { .. }
                | AccountOutcome::DeliveryFailed { .. }
                | AccountOutcome::CursorWriteFailed { .. }
        )
    }
}

impl fmt::Display for AccountOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountOutcome::Disabled => write!(f, "disabled"),
            AccountOutcome::NothingNew => write!(f, "nothing new"),
            AccountOutcome::Delivered { id } => write!(f, "delivered {}", id),
            AccountOutcome::CursorReadFailed { error_code } => {
                write!(f, "cursor read failed ({})", error_code)
            }
            AccountOutcome::RetrievalFailed { error_code } => {
                write!(f, "retrieval failed ({})", error_code)
            }
            AccountOutcome::DeliveryFailed { id, error_code } => {
                write!(f, "delivery of {} failed ({})", id, error_code)
            }
            AccountOutcome::CursorWriteFailed { id, error_code } => {
                write!(f, "delivered {} but cursor write failed ({})", id, error_code)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Set when the pass never reached the accounts.
    pub aborted: Option<String>,
    /// `(account name, outcome)` in configuration order.
    pub outcomes: Vec<(String, AccountOutcome)>,
}

impl RunReport {
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            outcomes: Vec::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn outcome(&self, account: &str) -> Option<&AccountOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == account)
            .map(|(_, outcome)| outcome)
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    AccountOutcome::Delivered { .. } | AccountOutcome::CursorWriteFailed { .. }
                )
            })
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .count()
    }
}
