//! Post identifiers taken from permalinks.
//!
//! Identifiers routinely exceed the 53-bit range that floating point can
//! represent exactly, so they are kept as canonical decimal digit strings and
//! ordered by magnitude (length first, then lexicographically).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Path segment that precedes the identifier in a post permalink.
pub const STATUS_MARKER: &str = "/status/";

/// Characters that terminate the identifier segment.
const SEGMENT_DELIMITERS: &[char] = &['/', '?', '#'];

/// Arbitrary-precision, totally ordered post identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SequenceId(String);

impl SequenceId {
    /// Parse a decimal digit string. Leading zeros are stripped so that
    /// equal magnitudes compare equal. Anything else yields `None`.
    pub fn parse(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        let canonical = if trimmed.is_empty() { "0" } else { trimmed };
        Some(Self(canonical.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for SequenceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

impl PartialOrd for SequenceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SequenceId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a decimal identifier: {:?}", value))
    }
}

impl From<SequenceId> for String {
    fn from(id: SequenceId) -> Self {
        id.0
    }
}

/// Extract the identifier that follows `/status/` in a permalink.
///
/// The segment runs up to the next `/`, `?` or `#` (or the end of the string)
/// and must consist of digits only.
pub fn extract_id(permalink: Option<&str>) -> Option<SequenceId> {
    let permalink = permalink?;
    let (_, after_marker) = permalink.split_once(STATUS_MARKER)?;
    let segment = after_marker
        .split(SEGMENT_DELIMITERS)
        .next()
        .unwrap_or_default();
    SequenceId::parse(segment)
}

/// Strict "newer than" test. With no last-seen id every valid id is newer.
pub fn is_newer(id: &SequenceId, last_seen: Option<&SequenceId>) -> bool {
    match last_seen {
        None => true,
        Some(last) => id > last,
    }
}
