//! Millisecond-precision timestamp wrapper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unix timestamp in milliseconds.
///
/// Commit paths that want a durable point-in-time carry one of these; the
/// catalog itself only threads it through to commit handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wraps a raw millisecond value.
    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    /// Raw millisecond value.
    #[inline]
    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let a = Timestamp::from_millis(1_730_000_000_000);
        let b = Timestamp::from_millis(1_730_000_000_001);
        assert!(a < b);
    }
}
