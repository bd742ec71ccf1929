//! Candidate classification and filtering.
//!
//! Everything here is pure: given the same candidates, cursor and reference
//! instant the result is always the same.

use crate::sequence::{extract_id, is_newer, SequenceId};
use crate::types::Candidate;
use crate::window::{in_window, DEFAULT_UTC_OFFSET_HOURS};
use chrono::{DateTime, Utc};

/// Markers the site prints on a pinned post, per UI locale.
pub const DEFAULT_PINNED_MARKERS: &[&str] = &["Pinned", "固定"];

/// Why a candidate was kept or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No permalink, or no identifier in it.
    Malformed,
    Pinned,
    /// Same as or older than the cursor.
    NotNewer(SequenceId),
    OutsideWindow(SequenceId),
    Qualifies(SequenceId),
}

/// The parts of a filtering pass that vary per account and per run.
#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub last_seen: Option<&'a SequenceId>,
    pub require_window: bool,
    pub reference: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pinned_markers: Vec<String>,
    utc_offset_hours: i32,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_PINNED_MARKERS.iter().map(|m| m.to_string()).collect(),
            DEFAULT_UTC_OFFSET_HOURS,
        )
    }
}

impl CandidateFilter {
    pub fn new(pinned_markers: Vec<String>, utc_offset_hours: i32) -> Self {
        Self {
            pinned_markers,
            utc_offset_hours,
        }
    }

    pub fn utc_offset_hours(&self) -> i32 {
        self.utc_offset_hours
    }

    /// Case-sensitive containment of any configured marker.
    pub fn is_pinned(&self, candidate: &Candidate) -> bool {
        self.pinned_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| candidate.body_text.contains(marker.as_str()))
    }

    /// Plain substring test, no case folding. No keyword matches everything.
    pub fn matches_keyword(candidate: &Candidate, keyword: Option<&str>) -> bool {
        keyword.map_or(true, |keyword| candidate.body_text.contains(keyword))
    }

    /// Checks run in a fixed order: identifier, pinned marker, cursor, window.
    pub fn classify(&self, candidate: &Candidate, input: &FilterInput<'_>) -> Verdict {
        let Some(id) = extract_id(candidate.permalink.as_deref()) else {
            return Verdict::Malformed;
        };
        if self.is_pinned(candidate) {
            return Verdict::Pinned;
        }
        if !is_newer(&id, input.last_seen) {
            return Verdict::NotNewer(id);
        }
        if input.require_window
            && !in_window(
                candidate.timestamp.as_deref(),
                input.reference,
                self.utc_offset_hours,
            )
        {
            return Verdict::OutsideWindow(id);
        }
        Verdict::Qualifies(id)
    }

    /// Every qualifying candidate, in input order.
    pub fn filter<'c>(
        &self,
        candidates: &'c [Candidate],
        input: &FilterInput<'_>,
    ) -> Vec<(&'c Candidate, SequenceId)> {
        candidates
            .iter()
            .filter_map(|candidate| match self.classify(candidate, input) {
                Verdict::Qualifies(id) => Some((candidate, id)),
                _ => None,
            })
            .collect()
    }

    /// First qualifying candidate of a reverse-chronological listing.
    ///
    /// The scan stops at the first candidate that is not newer than the
    /// cursor: everything after it in such a listing is older still.
    pub fn scan_until_seen<'c>(
        &self,
        candidates: &'c [Candidate],
        input: &FilterInput<'_>,
    ) -> Option<(&'c Candidate, SequenceId)> {
        for candidate in candidates {
            match self.classify(candidate, input) {
                Verdict::Qualifies(id) => return Some((candidate, id)),
                Verdict::NotNewer(id) => {
                    tracing::debug!(%id, "reached an already processed post, stopping scan");
                    return None;
                }
                Verdict::Malformed | Verdict::Pinned | Verdict::OutsideWindow(_) => {}
            }
        }
        None
    }
}
