//! Listing providers feeding the reconciliation engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider a raw listing was collected from.
///
/// The declaration order doubles as the default provenance ranking used when
/// merging fields: open map data first, review platforms next, scraped
/// directories last.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use corral_core::SourceId;
///
/// assert_eq!(SourceId::from_str("google_places"), Ok(SourceId::GooglePlaces));
/// assert!(SourceId::YellowPages.is_scraped());
/// assert_eq!(SourceId::Osm.to_string(), "osm");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// OpenStreetMap elements fetched through the Overpass API.
    Osm,
    /// Yelp Fusion business search results.
    Yelp,
    /// Google Places text search results.
    GooglePlaces,
    /// Store locator pages scraped from Boot Barn.
    BootBarn,
    /// Store locator pages scraped from Cavender's.
    Cavenders,
    /// Yellow Pages directory listings.
    YellowPages,
}

impl SourceId {
    /// Every known source in default provenance order.
    pub const ALL: [Self; 6] = [
        Self::Osm,
        Self::Yelp,
        Self::GooglePlaces,
        Self::BootBarn,
        Self::Cavenders,
        Self::YellowPages,
    ];

    /// Stable identifier used in record keys, configuration and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Osm => "osm",
            Self::Yelp => "yelp",
            Self::GooglePlaces => "google_places",
            Self::BootBarn => "boot_barn",
            Self::Cavenders => "cavenders",
            Self::YellowPages => "yellow_pages",
        }
    }

    /// Whether listings come from a scraped directory rather than an API.
    #[must_use]
    pub const fn is_scraped(self) -> bool {
        matches!(self, Self::BootBarn | Self::Cavenders | Self::YellowPages)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown source identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown listing source `{0}`")]
pub struct UnknownSource(pub String);

impl FromStr for SourceId {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| UnknownSource(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("osm", SourceId::Osm)]
    #[case("Yelp", SourceId::Yelp)]
    #[case("google-places", SourceId::GooglePlaces)]
    #[case(" boot_barn ", SourceId::BootBarn)]
    #[case("yellow pages", SourceId::YellowPages)]
    fn parses_known_sources(#[case] raw: &str, #[case] expected: SourceId) {
        assert_eq!(SourceId::from_str(raw), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_source() {
        let err = SourceId::from_str("foursquare").expect_err("unknown source");
        assert_eq!(err, UnknownSource("foursquare".into()));
    }

    #[rstest]
    fn display_round_trips_through_from_str() {
        for source in SourceId::ALL {
            assert_eq!(SourceId::from_str(&source.to_string()), Ok(source));
        }
    }

    #[rstest]
    fn serialises_in_snake_case() {
        let json = serde_json::to_string(&SourceId::GooglePlaces).expect("serialise");
        assert_eq!(json, "\"google_places\"");
    }
}
