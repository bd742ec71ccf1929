#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cursor_store::CursorStore;
use post_source::PostSource;
use postrelay_core::{
    parse_timestamp, AccountConfig, Candidate, CandidateFilter, CoreError, DeliveryError,
    FixedClock, NotifyTarget, QueryDateRange, SequenceId, SourceError, StoreError,
};
use relay_service::{DiscoveryStrategy, RunCoordinator};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use webhook_notifier::Notifier;

/// 12:00 on 2024-05-01 at UTC+9.
pub const REFERENCE: &str = "2024-05-01T03:00:00Z";
/// Inside the UTC+9 day of `REFERENCE`.
pub const IN_WINDOW: &str = "2024-05-01T02:00:00Z";
/// The UTC+9 day before.
pub const OUT_OF_WINDOW: &str = "2024-04-30T14:59:59Z";

pub fn reference() -> DateTime<Utc> {
    parse_timestamp(REFERENCE).unwrap()
}

pub fn id(s: &str) -> SequenceId {
    SequenceId::parse(s).unwrap()
}

pub fn post(id: &str, text: &str) -> Candidate {
    Candidate::new(format!("https://x.com/someone/status/{}", id), text)
}

pub fn account(name: &str, keyword: Option<&str>, webhook: Option<&str>) -> AccountConfig {
    AccountConfig {
        name: name.to_string(),
        target_handle: format!("{}_handle", name),
        keyword: keyword.map(str::to_string),
        cursor_key: format!("last_id_{}", name),
        notify_target: webhook.map(NotifyTarget::new),
    }
}

pub fn discovery(source: Arc<ScriptedSource>) -> DiscoveryStrategy {
    DiscoveryStrategy::new(
        source,
        CandidateFilter::default(),
        Arc::new(FixedClock(reference())),
        15,
    )
}

pub fn coordinator(
    source: Arc<ScriptedSource>,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
) -> RunCoordinator {
    RunCoordinator::new(discovery(source), store, notifier)
}

/// Source answering from per-handle scripts and recording every call.
pub struct ScriptedSource {
    ready: Result<bool, SourceError>,
    query: HashMap<String, Result<Vec<Candidate>, SourceError>>,
    recent: HashMap<String, Vec<Candidate>>,
    posts: HashMap<String, Candidate>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            ready: Ok(true),
            query: HashMap::new(),
            recent: HashMap::new(),
            posts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_query(mut self, handle: &str, candidates: Vec<Candidate>) -> Self {
        self.query.insert(handle.to_string(), Ok(candidates));
        self
    }

    pub fn failing_query(mut self, handle: &str, error: SourceError) -> Self {
        self.query.insert(handle.to_string(), Err(error));
        self
    }

    pub fn with_recent(mut self, handle: &str, candidates: Vec<Candidate>) -> Self {
        self.recent.insert(handle.to_string(), candidates);
        self
    }

    pub fn with_post(mut self, candidate: Candidate) -> Self {
        let key = candidate.permalink.clone().unwrap_or_default();
        self.posts.insert(key, candidate);
        self
    }

    pub fn with_session(mut self, ready: Result<bool, SourceError>) -> Self {
        self.ready = ready;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PostSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn session_ready(&self) -> Result<bool, CoreError> {
        self.record("session".to_string());
        self.ready.clone().map_err(CoreError::from)
    }

    async fn fetch_by_query(
        &self,
        handle: &str,
        keyword: Option<&str>,
        range: QueryDateRange,
    ) -> Result<Vec<Candidate>, CoreError> {
        self.record(format!(
            "query:{}:{}:{}:{}",
            handle,
            keyword.unwrap_or("-"),
            range.since,
            range.until
        ));
        match self.query.get(handle) {
            Some(Ok(candidates)) => Ok(candidates.clone()),
            Some(Err(e)) => Err(e.clone().into()),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_recent(
        &self,
        handle: &str,
        max_count: usize,
    ) -> Result<Vec<Candidate>, CoreError> {
        self.record(format!("recent:{}:{}", handle, max_count));
        Ok(self
            .recent
            .get(handle)
            .map(|candidates| candidates.iter().take(max_count).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_post(&self, permalink: &str) -> Result<Option<Candidate>, CoreError> {
        self.record(format!("post:{}", permalink));
        Ok(self.posts.get(permalink).cloned())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    cursors: Mutex<HashMap<String, SequenceId>>,
    fail_reads: bool,
    fail_writes: bool,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(self, key: &str, id: SequenceId) -> Self {
        self.cursors.lock().unwrap().insert(key.to_string(), id);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<SequenceId> {
        self.cursors.lock().unwrap().get(key).cloned()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl CursorStore for MemoryStore {
    async fn load(&self, cursor_key: &str) -> Result<Option<SequenceId>, CoreError> {
        if self.fail_reads {
            return Err(StoreError::ConnectionFailed {
                reason: "store offline".to_string(),
            }
            .into());
        }
        Ok(self.get(cursor_key))
    }

    async fn save(&self, cursor_key: &str, id: &SequenceId) -> Result<(), CoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed {
                key: cursor_key.to_string(),
                reason: "disk full".to_string(),
            }
            .into());
        }
        *self.saves.lock().unwrap() += 1;
        self.cursors
            .lock()
            .unwrap()
            .insert(cursor_key.to_string(), id.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    rejecting: HashSet<String>,
    delivered: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `target` come back as HTTP 500.
    pub fn rejecting(mut self, target: &str) -> Self {
        self.rejecting.insert(target.to_string());
        self
    }

    /// `(target, permalink)` pairs, in delivery order.
    pub fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, target: &NotifyTarget, permalink: &str) -> Result<(), CoreError> {
        if self.rejecting.contains(target.as_str()) {
            return Err(DeliveryError::Rejected { status: 500 }.into());
        }
        self.delivered
            .lock()
            .unwrap()
            .push((target.as_str().to_string(), permalink.to_string()));
        Ok(())
    }
}
