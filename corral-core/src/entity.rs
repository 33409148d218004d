//! Merged entities produced by the dedup engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CanonicalRecord, Category, RecordKey, ReviewSummary, SourceId};

/// Content-derived cluster identifier.
///
/// The hex SHA-256 of the sorted member keys, so the same membership always
/// yields the same id regardless of input order.
///
/// # Examples
///
/// ```
/// use corral_core::{ClusterId, RecordKey, SourceId};
///
/// let a = RecordKey::new(SourceId::Osm, "node/1");
/// let b = RecordKey::new(SourceId::Yelp, "boot-barn-fw");
/// assert_eq!(
///     ClusterId::from_members([&a, &b]),
///     ClusterId::from_members([&b, &a]),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    /// Derive the id from member keys.
    pub fn from_members<'a>(keys: impl IntoIterator<Item = &'a RecordKey>) -> Self {
        let sorted: BTreeSet<&RecordKey> = keys.into_iter().collect();
        let mut hasher = Sha256::new();
        for key in sorted {
            hasher.update(key.to_string().as_bytes());
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        Self(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A merged value with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributed<T> {
    /// Chosen value.
    pub value: T,
    /// Record that supplied it.
    pub source: RecordKey,
    /// Confidence of that record in this field.
    pub confidence: f64,
}

/// Fields settled by the merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeField {
    /// Display name.
    Name,
    /// Street line.
    Street,
    /// City.
    City,
    /// State code.
    State,
    /// ZIP code.
    Zip,
    /// Phone number.
    Phone,
    /// Website.
    Website,
    /// Category.
    Category,
    /// Coordinates.
    Location,
}

/// Merged field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedFields {
    /// Display name.
    pub name: Attributed<String>,
    /// Street line.
    pub street: Option<Attributed<String>>,
    /// City.
    pub city: Option<Attributed<String>>,
    /// State code.
    pub state: Option<Attributed<String>>,
    /// ZIP code.
    pub zip: Option<Attributed<String>>,
    /// Phone number.
    pub phone: Option<Attributed<String>>,
    /// Website.
    pub website: Option<Attributed<String>>,
    /// Category.
    pub category: Attributed<Category>,
    /// Coordinates.
    pub location: Option<Attributed<Coord>>,
}

/// Lowest and highest pairwise score inside a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    /// Lowest pairwise score.
    pub min: f64,
    /// Highest pairwise score.
    pub max: f64,
}

impl ScoreRange {
    /// `max - min`.
    #[must_use]
    pub fn spread(self) -> f64 {
        self.max - self.min
    }
}

/// Why an entity needs manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewReason {
    /// Internal pairwise scores disagree too much.
    ScoreSpread {
        /// `max - min` of the internal scores.
        spread: f64,
    },
    /// A member's address geocoded to several distant places.
    AmbiguousLocation {
        /// The ambiguous member.
        record: RecordKey,
    },
    /// Members offered comparably confident coordinates lying far apart.
    ConflictingLocations {
        /// Distance in metres from the chosen coordinate to the farthest rival.
        spread_m: f64,
    },
    /// Equal-rank, equal-confidence values disagreed and the tie-break rule
    /// asked for review.
    UnsettledConflict {
        /// Field in conflict.
        field: MergeField,
    },
}

/// One real-world store assembled from one or more listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntity {
    /// Content-derived id.
    pub id: ClusterId,
    /// Contributing records ordered by key.
    pub members: Vec<CanonicalRecord>,
    /// Merged field values with provenance.
    pub fields: MergedFields,
    /// Union of the members' provider categories.
    pub categories: BTreeSet<String>,
    /// Review summary per source, keeping the higher review count.
    pub reviews: BTreeMap<SourceId, ReviewSummary>,
    /// Mean confidence of the chosen field values.
    pub confidence: f64,
    /// Internal pairwise score range; `None` for singletons.
    pub score_range: Option<ScoreRange>,
    /// Reasons for manual review; empty when none.
    pub review_reasons: Vec<ReviewReason>,
}

impl MergedEntity {
    /// Whether the entity should be checked by hand.
    #[must_use]
    pub const fn needs_review(&self) -> bool {
        !self.review_reasons.is_empty()
    }

    /// Distinct sources among the members.
    #[must_use]
    pub fn sources(&self) -> BTreeSet<SourceId> {
        self.members.iter().map(CanonicalRecord::source).collect()
    }

    /// Keys of the contributing records.
    pub fn member_keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.members.iter().map(|member| &member.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn cluster_id_is_hex_sha256() {
        let key = RecordKey::new(SourceId::Osm, "node/1");
        let id = ClusterId::from_members([&key]);
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[rstest]
    fn cluster_id_depends_on_membership() {
        let a = RecordKey::new(SourceId::Osm, "node/1");
        let b = RecordKey::new(SourceId::Osm, "node/2");
        assert_ne!(ClusterId::from_members([&a]), ClusterId::from_members([&a, &b]));
    }

    #[rstest]
    fn duplicate_keys_do_not_change_id() {
        let a = RecordKey::new(SourceId::Yelp, "x");
        assert_eq!(
            ClusterId::from_members([&a, &a]),
            ClusterId::from_members([&a])
        );
    }

    #[rstest]
    fn spread_is_max_minus_min() {
        let range = ScoreRange { min: 0.5, max: 0.9 };
        assert!((range.spread() - 0.4).abs() < 1e-12);
    }
}
