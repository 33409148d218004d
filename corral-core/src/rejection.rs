//! Records the normaliser refused to canonicalise.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RecordKey;

/// Why a raw record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The listing has no usable name.
    MissingName,
    /// The listing has no coordinates and no usable locality, so it can be
    /// neither geocoded nor matched.
    UnparseableAddress,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingName => "missing name",
            Self::UnparseableAddress => "unparseable address",
        })
    }
}

/// A skipped record and the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Record that was skipped.
    pub key: RecordKey,
    /// Why.
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}
