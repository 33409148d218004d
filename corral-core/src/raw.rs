//! Raw listings as delivered by the fetch adapters.
//!
//! Each provider keeps its own payload shape. The shapes mirror the JSON the
//! providers return so adapters can hand records over without reshaping them;
//! only the normaliser reads them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SourceId;

/// A listing exactly as a fetch adapter produced it.
///
/// The payload variant fixes the source, so the two can never disagree.
///
/// # Examples
///
/// ```
/// use corral_core::{RawRecord, ScrapedListing, SourceId, SourcePayload};
///
/// let listing = ScrapedListing {
///     name: Some("Boot Barn #4521".into()),
///     city: Some("Fort Worth".into()),
///     state: Some("TX".into()),
///     ..ScrapedListing::default()
/// };
/// let record = RawRecord::new("4521", 1_700_000_000, SourcePayload::BootBarn(listing));
/// assert_eq!(record.source(), SourceId::BootBarn);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Identifier of the listing inside its source.
    pub key: String,
    /// Retrieval time in unix seconds.
    pub retrieved_at: u64,
    /// Provider-specific body.
    #[serde(flatten)]
    pub payload: SourcePayload,
}

impl RawRecord {
    /// Build a raw record from its parts.
    pub fn new(key: impl Into<String>, retrieved_at: u64, payload: SourcePayload) -> Self {
        Self {
            key: key.into(),
            retrieved_at,
            payload,
        }
    }

    /// Source implied by the payload variant.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.payload.source()
    }
}

/// Provider-specific record body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "data", rename_all = "snake_case")]
pub enum SourcePayload {
    /// Overpass element.
    Osm(OsmElement),
    /// Yelp Fusion business.
    Yelp(YelpBusiness),
    /// Google Places (new API) place.
    GooglePlaces(GooglePlace),
    /// Boot Barn store locator entry.
    BootBarn(ScrapedListing),
    /// Cavender's store locator entry.
    Cavenders(ScrapedListing),
    /// Yellow Pages directory entry.
    YellowPages(ScrapedListing),
}

impl SourcePayload {
    /// Source the payload belongs to.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        match self {
            Self::Osm(_) => SourceId::Osm,
            Self::Yelp(_) => SourceId::Yelp,
            Self::GooglePlaces(_) => SourceId::GooglePlaces,
            Self::BootBarn(_) => SourceId::BootBarn,
            Self::Cavenders(_) => SourceId::Cavenders,
            Self::YellowPages(_) => SourceId::YellowPages,
        }
    }
}

/// Latitude/longitude pair as Overpass encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Overpass JSON element.
///
/// Nodes carry `lat`/`lon`; ways and relations queried with `out center`
/// carry a `center` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsmElement {
    /// Element kind: `node`, `way` or `relation`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// OSM identifier.
    #[serde(default)]
    pub id: u64,
    /// Node latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Node longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Way or relation centroid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLon>,
    /// Element tags such as `name`, `addr:street` and `shop`.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl OsmElement {
    /// Tag value, if present and non-blank.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Node position or way centre, whichever is present.
    #[must_use]
    pub fn position(&self) -> Option<LatLon> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LatLon { lat, lon }),
            _ => self.center,
        }
    }
}

/// Yelp Fusion business search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YelpBusiness {
    /// Yelp business id.
    #[serde(default)]
    pub id: String,
    /// Business name.
    #[serde(default)]
    pub name: String,
    /// Postal location.
    #[serde(default)]
    pub location: YelpLocation,
    /// Coordinates, when Yelp knows them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<YelpCoordinates>,
    /// Phone in E.164 form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Phone formatted for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_phone: Option<String>,
    /// Yelp category labels.
    #[serde(default)]
    pub categories: Vec<YelpCategory>,
    /// Average star rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Number of reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    /// Yelp listing URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Whether Yelp marks the business as permanently closed.
    #[serde(default)]
    pub is_closed: bool,
}

/// Yelp postal location block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YelpLocation {
    /// First street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Address lines formatted for display.
    #[serde(default)]
    pub display_address: Vec<String>,
}

/// Yelp coordinates block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YelpCoordinates {
    /// Latitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Yelp category entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YelpCategory {
    /// Machine alias, e.g. `shoes`.
    #[serde(default)]
    pub alias: String,
    /// Display title, e.g. `Shoe Stores`.
    #[serde(default)]
    pub title: String,
}

/// Google Places (new API) place resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlace {
    /// Place id.
    #[serde(default)]
    pub id: String,
    /// Localised display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<LocalizedText>,
    /// Single-line postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    /// Place position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GoogleLatLng>,
    /// Phone number in national format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_phone_number: Option<String>,
    /// Website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_uri: Option<String>,
    /// Place types such as `shoe_store`.
    #[serde(default)]
    pub types: Vec<String>,
    /// Average rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Number of user ratings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating_count: Option<u32>,
}

/// Google localised text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    /// Text content.
    #[serde(default)]
    pub text: String,
    /// BCP-47 language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// Google position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoogleLatLng {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Listing scraped from a store locator or directory page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedListing {
    /// Store name as printed on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State code or name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Phone as printed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Store page URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Latitude, when the page embeds a map pin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude, when the page embeds a map pin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Directory category labels.
    #[serde(default)]
    pub categories: Vec<String>,
}
