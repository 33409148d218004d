//! Canonical listing representation shared by every stage after normalisation.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::SourceId;

/// Identity of one raw listing: its source and provider key.
///
/// Ordered by source, then key. Printed as `source:key`.
///
/// # Examples
///
/// ```
/// use corral_core::{RecordKey, SourceId};
///
/// let key = RecordKey::new(SourceId::Osm, "node/42");
/// assert_eq!(key.to_string(), "osm:node/42");
/// assert!(key < RecordKey::new(SourceId::Yelp, "a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Provider the listing came from.
    pub source: SourceId,
    /// Identifier inside that provider.
    pub key: String,
}

impl RecordKey {
    /// Build a key.
    pub fn new(source: SourceId, key: impl Into<String>) -> Self {
        Self {
            source,
            key: key.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.key)
    }
}

/// Retail category assigned by keyword classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// General western apparel.
    WesternWear,
    /// Boot specialists.
    BootShop,
    /// Hat specialists.
    HatShop,
    /// Several categories matched, or none did.
    Mixed,
}

impl Category {
    /// Identifier used in configuration and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WesternWear => "western_wear",
            Self::BootShop => "boot_shop",
            Self::HatShop => "hat_shop",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field confidence in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence {
    /// Confidence in the display name.
    pub name: f64,
    /// Confidence in street and locality.
    pub address: f64,
    /// Confidence in the phone number.
    pub phone: f64,
    /// Confidence in the category.
    pub category: f64,
    /// Confidence in the coordinates; zero when unknown.
    pub location: f64,
}

/// Why a record could not be geocoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The geocoder failed, timed out or found nothing.
    GeocodeUnavailable,
    /// The geocoder returned candidates too far apart to choose between.
    AmbiguousLocation {
        /// Number of candidates returned.
        candidates: usize,
    },
}

/// How a record obtained, or failed to obtain, its coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GeocodeStatus {
    /// Coordinates came with the listing.
    #[default]
    Provided,
    /// Coordinates were filled in by the geocoder.
    Resolved {
        /// Geocoder confidence for the chosen candidate.
        confidence: f64,
    },
    /// No coordinates are known.
    Unresolved {
        /// Why resolution failed.
        #[serde(flatten)]
        reason: UnresolvedReason,
    },
}

impl GeocodeStatus {
    /// Whether resolution stopped on ambiguous candidates.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::Unresolved {
                reason: UnresolvedReason::AmbiguousLocation { .. }
            }
        )
    }
}

/// Star rating and review volume from one provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Average rating, when published.
    pub rating: Option<f64>,
    /// Number of reviews behind the rating.
    pub count: u32,
}

/// A listing in canonical form.
///
/// Produced by the normaliser from exactly one raw record. The geocode
/// resolver may fill in `location`; nothing else changes it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Identity of the raw record this came from.
    pub key: RecordKey,
    /// Retrieval time in unix seconds.
    pub retrieved_at: u64,
    /// Display name, whitespace collapsed.
    pub name: String,
    /// Case-folded match key without punctuation, store numbers or generic
    /// suffixes.
    pub name_key: String,
    /// Case-folded street line with suffixes and directionals expanded.
    pub street: Option<String>,
    /// City in title case.
    pub city: Option<String>,
    /// Two-letter state code.
    pub state: Option<String>,
    /// Five-digit ZIP code.
    pub zip: Option<String>,
    /// Digits-only phone number without the US country code.
    pub phone: Option<String>,
    /// Website or listing URL.
    pub website: Option<String>,
    /// Classified category.
    pub category: Category,
    /// The provider's own category labels.
    pub provider_categories: BTreeSet<String>,
    /// Provider rating and review volume.
    pub reviews: Option<ReviewSummary>,
    /// WGS84 position, `x` longitude and `y` latitude.
    pub location: Option<Coord>,
    /// Where the position came from.
    pub geocode: GeocodeStatus,
    /// Confidence per field.
    pub confidence: FieldConfidence,
}

impl CanonicalRecord {
    /// Source the record came from.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.key.source
    }

    /// Single-line address used as the geocoder query and cache key.
    ///
    /// Returns `None` when neither a locality nor a ZIP is known.
    #[must_use]
    pub fn address_query(&self) -> Option<String> {
        if !self.has_locality() {
            return None;
        }
        let mut parts: Vec<String> = self.street.iter().cloned().collect();
        parts.extend(self.city.as_ref().map(|city| city.to_lowercase()));
        parts.extend(match (&self.state, &self.zip) {
            (Some(state), Some(zip)) => Some(format!("{} {zip}", state.to_lowercase())),
            (Some(state), None) => Some(state.to_lowercase()),
            (None, Some(zip)) => Some(zip.clone()),
            (None, None) => None,
        });
        Some(parts.join(", "))
    }

    /// Whether the record names a city and state, or a ZIP.
    #[must_use]
    pub const fn has_locality(&self) -> bool {
        (self.city.is_some() && self.state.is_some()) || self.zip.is_some()
    }

    /// Apply a geocoder result unless it would overwrite better coordinates.
    ///
    /// Returns `true` when the location changed. Existing coordinates are only
    /// replaced by a strictly more confident candidate.
    pub fn apply_geocode(&mut self, location: Coord, confidence: f64) -> bool {
        if self.location.is_some()
            && self
                .confidence
                .location
                .partial_cmp(&confidence)
                .is_none_or(|ordering| ordering != Ordering::Less)
        {
            return false;
        }
        self.location = Some(location);
        self.confidence.location = confidence;
        self.geocode = GeocodeStatus::Resolved { confidence };
        true
    }

    /// Mark the record as lacking usable coordinates.
    ///
    /// Records that already carry coordinates keep them; only the status of
    /// records without a position changes.
    pub fn mark_unresolved(&mut self, reason: UnresolvedReason) {
        if self.location.is_none() {
            self.confidence.location = 0.0;
            self.geocode = GeocodeStatus::Unresolved { reason };
        }
    }
}
