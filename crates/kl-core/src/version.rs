//! Migration version tokens.
//!
//! A version is one or more dot-separated decimal segments (`001`,
//! `20240101120000`, `1.2`). Ordering and equality are numeric per segment, so
//! `2 < 10` and `001 == 1`. The raw token is preserved for display and is the
//! value written to the ledger.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A parsed, totally ordered migration version.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<u64>,
}

impl Version {
    /// Parse a version token, returning `None` when it is not made of
    /// non-empty decimal segments separated by single dots.
    pub fn parse(token: &str) -> Option<Self> {
        if token.is_empty() {
            return None;
        }
        let segments = token
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                segment.parse::<u64>().ok()
            })
            .collect::<Option<Vec<u64>>>()?;
        Some(Self {
            raw: token.to_string(),
            segments,
        })
    }

    /// The token exactly as written in the file name or ledger.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric segments used for comparison.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
