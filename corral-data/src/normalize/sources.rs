//! Per-source field extraction.
//!
//! Each provider spells the same facts differently. Extraction pulls them into
//! one [`Extracted`] shape; the normaliser then cleans the strings.

use std::collections::BTreeSet;

use corral_core::{
    GooglePlace, LatLon, OsmElement, ReviewSummary, ScrapedListing, SourcePayload, YelpBusiness,
};
use geo::Coord;

use super::address::{ParsedAddress, parse_formatted_address};

/// Base confidence and coordinate confidence for one provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SourceTrust {
    /// Confidence in names and addresses from this provider.
    pub(crate) base: f64,
    /// Confidence in coordinates from this provider.
    pub(crate) location: f64,
}

const OSM_TRUST: SourceTrust = SourceTrust {
    base: 0.9,
    location: 0.95,
};
const YELP_TRUST: SourceTrust = SourceTrust {
    base: 0.85,
    location: 0.85,
};
const GOOGLE_TRUST: SourceTrust = SourceTrust {
    base: 0.9,
    location: 0.9,
};
const SCRAPED_TRUST: SourceTrust = SourceTrust {
    base: 0.6,
    location: 0.6,
};

/// Raw strings pulled from a payload, not yet normalised.
#[derive(Debug, Clone, Default)]
pub(crate) struct Extracted {
    pub(crate) name: Option<String>,
    pub(crate) street: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) zip: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) website: Option<String>,
    /// Provider category labels kept on the record.
    pub(crate) categories: BTreeSet<String>,
    /// Extra texts that only feed classification, such as an OSM brand.
    pub(crate) hints: Vec<String>,
    pub(crate) reviews: Option<ReviewSummary>,
    pub(crate) location: Option<Coord>,
    pub(crate) trust: SourceTrust,
}

impl Default for SourceTrust {
    fn default() -> Self {
        SCRAPED_TRUST
    }
}

/// Pull the fields out of any payload variant.
pub(crate) fn extract(payload: &SourcePayload) -> Extracted {
    match payload {
        SourcePayload::Osm(element) => from_osm(element),
        SourcePayload::Yelp(business) => from_yelp(business),
        SourcePayload::GooglePlaces(place) => from_google(place),
        SourcePayload::BootBarn(listing)
        | SourcePayload::Cavenders(listing)
        | SourcePayload::YellowPages(listing) => from_scraped(listing),
    }
}

/// Accept only finite, in-range, non-null-island coordinates.
fn valid_coord(lat: f64, lon: f64) -> Option<Coord> {
    let in_range = lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon);
    let null_island = lat == 0.0 && lon == 0.0;
    (in_range && !null_island).then_some(Coord { x: lon, y: lat })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn with_parsed(mut extracted: Extracted, parsed: ParsedAddress) -> Extracted {
    extracted.street = extracted.street.or(parsed.street);
    extracted.city = extracted.city.or(parsed.city);
    extracted.state = extracted.state.or(parsed.state);
    extracted.zip = extracted.zip.or(parsed.zip);
    extracted
}

fn from_osm(element: &OsmElement) -> Extracted {
    let street = match (element.tag("addr:housenumber"), element.tag("addr:street")) {
        (Some(number), Some(street)) => Some(format!("{number} {street}")),
        (None, Some(street)) => Some(street.to_owned()),
        _ => None,
    };
    Extracted {
        name: non_blank(element.tag("name")),
        street,
        city: non_blank(element.tag("addr:city")),
        state: non_blank(element.tag("addr:state")),
        zip: non_blank(element.tag("addr:postcode")),
        phone: non_blank(element.tag("phone").or_else(|| element.tag("contact:phone"))),
        website: non_blank(
            element
                .tag("website")
                .or_else(|| element.tag("contact:website")),
        ),
        categories: element.tag("shop").map(str::to_owned).into_iter().collect(),
        hints: element.tag("brand").map(str::to_owned).into_iter().collect(),
        reviews: None,
        location: element
            .position()
            .and_then(|LatLon { lat, lon }| valid_coord(lat, lon)),
        trust: OSM_TRUST,
    }
}

fn from_yelp(business: &YelpBusiness) -> Extracted {
    let location = &business.location;
    let extracted = Extracted {
        name: non_blank(Some(&business.name)),
        street: non_blank(location.address1.as_deref()),
        city: non_blank(location.city.as_deref()),
        state: non_blank(location.state.as_deref()),
        zip: non_blank(location.zip_code.as_deref()),
        phone: non_blank(
            business
                .phone
                .as_deref()
                .or(business.display_phone.as_deref()),
        ),
        website: non_blank(business.url.as_deref()),
        categories: business
            .categories
            .iter()
            .filter_map(|category| non_blank(Some(&category.title)))
            .collect(),
        hints: business
            .categories
            .iter()
            .filter_map(|category| non_blank(Some(&category.alias)))
            .collect(),
        reviews: business.review_count.map(|count| ReviewSummary {
            rating: business.rating,
            count,
        }),
        location: business.coordinates.and_then(|coordinates| {
            coordinates
                .latitude
                .zip(coordinates.longitude)
                .and_then(|(lat, lon)| valid_coord(lat, lon))
        }),
        trust: YELP_TRUST,
    };
    if location.display_address.is_empty() {
        return extracted;
    }
    with_parsed(
        extracted,
        parse_formatted_address(&location.display_address.join(", ")),
    )
}

fn from_google(place: &GooglePlace) -> Extracted {
    let extracted = Extracted {
        name: place
            .display_name
            .as_ref()
            .and_then(|name| non_blank(Some(&name.text))),
        phone: non_blank(place.national_phone_number.as_deref()),
        website: non_blank(place.website_uri.as_deref()),
        categories: place.types.iter().cloned().collect(),
        reviews: place.user_rating_count.map(|count| ReviewSummary {
            rating: place.rating,
            count,
        }),
        location: place
            .location
            .and_then(|location| valid_coord(location.latitude, location.longitude)),
        trust: GOOGLE_TRUST,
        ..Extracted::default()
    };
    match place.formatted_address.as_deref() {
        Some(address) => with_parsed(extracted, parse_formatted_address(address)),
        None => extracted,
    }
}

fn from_scraped(listing: &ScrapedListing) -> Extracted {
    Extracted {
        name: non_blank(listing.name.as_deref()),
        street: non_blank(listing.street.as_deref()),
        city: non_blank(listing.city.as_deref()),
        state: non_blank(listing.state.as_deref()),
        zip: non_blank(listing.zip.as_deref()),
        phone: non_blank(listing.phone.as_deref()),
        website: non_blank(listing.url.as_deref()),
        categories: listing.categories.iter().cloned().collect(),
        hints: Vec::new(),
        reviews: None,
        location: listing
            .latitude
            .zip(listing.longitude)
            .and_then(|(lat, lon)| valid_coord(lat, lon)),
        trust: SCRAPED_TRUST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::{GoogleLatLng, LocalizedText, YelpCategory, YelpCoordinates, YelpLocation};
    use rstest::rstest;

    #[rstest]
    fn osm_way_uses_centre_and_joins_house_number() {
        let element = OsmElement {
            kind: "way".into(),
            id: 7,
            center: Some(LatLon {
                lat: 32.75,
                lon: -97.33,
            }),
            tags: [
                ("name", "Boot Barn"),
                ("addr:housenumber", "100"),
                ("addr:street", "Main St"),
                ("shop", "shoes"),
                ("brand", "Boot Barn"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
            ..OsmElement::default()
        };
        let extracted = extract(&SourcePayload::Osm(element));
        assert_eq!(extracted.street.as_deref(), Some("100 Main St"));
        assert_eq!(extracted.location, Some(Coord { x: -97.33, y: 32.75 }));
        assert!(extracted.categories.contains("shoes"));
        assert_eq!(extracted.hints, vec!["Boot Barn".to_owned()]);
        assert_eq!(extracted.trust, OSM_TRUST);
    }

    #[rstest]
    fn yelp_falls_back_to_display_address() {
        let business = YelpBusiness {
            id: "boot-barn-fw".into(),
            name: "BOOT BARN".into(),
            location: YelpLocation {
                address1: Some("100 Main St".into()),
                display_address: vec!["100 Main St".into(), "Fort Worth, TX 76102".into()],
                ..YelpLocation::default()
            },
            coordinates: Some(YelpCoordinates {
                latitude: Some(32.75),
                longitude: Some(-97.33),
            }),
            categories: vec![YelpCategory {
                alias: "shoes".into(),
                title: "Shoe Stores".into(),
            }],
            rating: Some(4.5),
            review_count: Some(120),
            ..YelpBusiness::default()
        };
        let extracted = extract(&SourcePayload::Yelp(business));
        assert_eq!(extracted.street.as_deref(), Some("100 Main St"));
        assert_eq!(extracted.city.as_deref(), Some("Fort Worth"));
        assert_eq!(extracted.state.as_deref(), Some("TX"));
        assert_eq!(extracted.zip.as_deref(), Some("76102"));
        assert_eq!(
            extracted.reviews,
            Some(ReviewSummary {
                rating: Some(4.5),
                count: 120
            })
        );
    }

    #[rstest]
    fn google_parses_formatted_address() {
        let place = GooglePlace {
            id: "ChIJ".into(),
            display_name: Some(LocalizedText {
                text: "Cavender's".into(),
                language_code: Some("en".into()),
            }),
            formatted_address: Some("4601 S Cooper St, Arlington, TX 76017, USA".into()),
            location: Some(GoogleLatLng {
                latitude: 32.68,
                longitude: -97.13,
            }),
            ..GooglePlace::default()
        };
        let extracted = extract(&SourcePayload::GooglePlaces(place));
        assert_eq!(extracted.name.as_deref(), Some("Cavender's"));
        assert_eq!(extracted.city.as_deref(), Some("Arlington"));
        assert_eq!(extracted.street.as_deref(), Some("4601 south cooper street"));
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(91.0, -97.0)]
    #[case(f64::NAN, -97.0)]
    fn drops_unusable_coordinates(#[case] lat: f64, #[case] lon: f64) {
        let listing = ScrapedListing {
            name: Some("Boot Barn".into()),
            latitude: Some(lat),
            longitude: Some(lon),
            ..ScrapedListing::default()
        };
        assert_eq!(extract(&SourcePayload::BootBarn(listing)).location, None);
    }
}
