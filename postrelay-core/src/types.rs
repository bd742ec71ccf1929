use crate::sequence::SequenceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observed post as handed over by the rendering collaborator.
///
/// Field names on the wire follow the extraction script (`link`, `text`,
/// `time`). Absent values stay `None` and are dealt with by the filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "link", default)]
    pub permalink: Option<String>,
    #[serde(rename = "text", default)]
    pub body_text: String,
    #[serde(rename = "time", default)]
    pub timestamp: Option<String>,
}

impl Candidate {
    pub fn new(permalink: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            permalink: Some(permalink.into()),
            body_text: body_text.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Where a relayed post goes. Currently always a webhook URL.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifyTarget(String);

impl NotifyTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Webhook URLs embed their secret token; keep it out of logs.
impl fmt::Debug for NotifyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible = self.0.split('?').next().unwrap_or_default();
        let visible = visible.rsplit_once('/').map_or(visible, |(head, _)| head);
        write!(f, "NotifyTarget({}/***)", visible)
    }
}

/// One monitored account. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub name: String,
    pub target_handle: String,
    pub keyword: Option<String>,
    pub cursor_key: String,
    pub notify_target: Option<NotifyTarget>,
}

impl AccountConfig {
    /// The keyword guard only applies when a keyword is configured.
    pub fn requires_window(&self) -> bool {
        self.keyword.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    Primary,
    Fallback,
    SinglePost,
}

impl fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiscoveryPhase::Primary => "primary",
            DiscoveryPhase::Fallback => "fallback",
            DiscoveryPhase::SinglePost => "single-post",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub candidate: Candidate,
    pub id: SequenceId,
    pub phase: DiscoveryPhase,
}

impl Discovered {
    /// Discovered candidates always carry the permalink their id came from.
    pub fn permalink(&self) -> &str {
        self.candidate.permalink.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Found(Discovered),
    NoneFound,
}

impl Decision {
    pub fn found(self) -> Option<Discovered> {
        match self {
            Decision::Found(discovered) => Some(discovered),
            Decision::NoneFound => None,
        }
    }
}
