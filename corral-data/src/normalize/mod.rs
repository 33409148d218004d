//! Source-specific records to canonical form.
//!
//! The [`Normalizer`] is pure: it reads a [`RawRecord`] and either returns a
//! [`CanonicalRecord`] or a [`Rejection`] naming why the record cannot take
//! part in matching. Batches never abort on a bad record.

mod address;
mod category;
mod sources;
mod text;

use corral_core::{
    CanonicalRecord, FieldConfidence, GeocodeStatus, NormalizeConfig, RawRecord, RecordKey,
    RejectReason, Rejection, UnresolvedReason,
};
use log::{debug, info};

use self::address::{normalize_city, normalize_phone, normalize_state, normalize_street, normalize_zip};
use self::category::classify;
use self::sources::extract;
use self::text::{display_name, name_key};

/// Confidence in a ten-digit phone number.
const FULL_PHONE_CONFIDENCE: f64 = 0.9;
/// Confidence in any other phone number.
const PARTIAL_PHONE_CONFIDENCE: f64 = 0.4;

/// Output of [`Normalizer::normalize_batch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Records that normalised cleanly, in input order.
    pub records: Vec<CanonicalRecord>,
    /// Records that were skipped, in input order.
    pub rejections: Vec<Rejection>,
}

/// Turns raw provider records into [`CanonicalRecord`]s.
///
/// # Examples
///
/// ```
/// use corral_core::{
///     Category, NormalizeConfig, RawRecord, RejectReason, ScrapedListing, SourcePayload,
/// };
/// use corral_data::Normalizer;
///
/// let normalizer = Normalizer::new(NormalizeConfig::default());
/// let listing = ScrapedListing {
///     name: Some("BOOT BARN #4521".into()),
///     street: Some("100 Main St".into()),
///     city: Some("FORT WORTH".into()),
///     state: Some("Texas".into()),
///     ..ScrapedListing::default()
/// };
/// let raw = RawRecord::new("4521", 0, SourcePayload::BootBarn(listing));
/// let record = normalizer.normalize(&raw).expect("normalises");
/// assert_eq!(record.name_key, "boot barn");
/// assert_eq!(record.street.as_deref(), Some("100 main street"));
/// assert_eq!(record.state.as_deref(), Some("TX"));
/// assert_eq!(record.category, Category::BootShop);
///
/// let nameless = RawRecord::new("1", 0, SourcePayload::BootBarn(ScrapedListing::default()));
/// let rejection = normalizer.normalize(&nameless).expect_err("no name");
/// assert_eq!(rejection.reason, RejectReason::MissingName);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    /// Build a normaliser classifying against `config`'s keyword lists.
    #[must_use]
    pub const fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// Normalise one raw record.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] when the record has no usable name, or when it
    /// has neither coordinates nor a locality to geocode and block on.
    pub fn normalize(&self, raw: &RawRecord) -> Result<CanonicalRecord, Rejection> {
        let key = RecordKey::new(raw.source(), raw.key.clone());
        let extracted = extract(&raw.payload);
        let Some(name) = extracted.name.as_deref().and_then(display_name) else {
            return Err(Rejection {
                key,
                reason: RejectReason::MissingName,
            });
        };

        let street = extracted.street.as_deref().and_then(normalize_street);
        let city = extracted.city.as_deref().and_then(normalize_city);
        let state = extracted.state.as_deref().and_then(normalize_state);
        let zip = extracted.zip.as_deref().and_then(normalize_zip);
        let has_locality = (city.is_some() && state.is_some()) || zip.is_some();
        if extracted.location.is_none() && !has_locality {
            return Err(Rejection {
                key,
                reason: RejectReason::UnparseableAddress,
            });
        }

        let phone = extracted.phone.as_deref().and_then(normalize_phone);
        let texts = std::iter::once(name.as_str())
            .chain(extracted.categories.iter().map(String::as_str))
            .chain(extracted.hints.iter().map(String::as_str));
        let (category, category_confidence) = classify(texts, &self.config.keywords);

        let trust = extracted.trust;
        let present = [&street, &city, &state, &zip]
            .iter()
            .filter(|part| part.is_some())
            .count();
        let completeness = f64::from(u8::try_from(present).unwrap_or(4)) / 4.0;
        let confidence = FieldConfidence {
            name: trust.base,
            address: trust.base * completeness,
            phone: phone.as_ref().map_or(0.0, |digits| {
                if digits.len() == 10 {
                    FULL_PHONE_CONFIDENCE
                } else {
                    PARTIAL_PHONE_CONFIDENCE
                }
            }),
            category: category_confidence,
            location: if extracted.location.is_some() {
                trust.location
            } else {
                0.0
            },
        };
        let geocode = if extracted.location.is_some() {
            GeocodeStatus::Provided
        } else {
            GeocodeStatus::Unresolved {
                reason: UnresolvedReason::GeocodeUnavailable,
            }
        };

        Ok(CanonicalRecord {
            key,
            retrieved_at: raw.retrieved_at,
            name_key: name_key(&name),
            name,
            street,
            city,
            state,
            zip,
            phone,
            website: extracted.website,
            category,
            provider_categories: extracted.categories,
            reviews: extracted.reviews,
            location: extracted.location,
            geocode,
            confidence,
        })
    }

    /// Normalise a batch, splitting clean records from rejections.
    #[must_use]
    pub fn normalize_batch(&self, raws: Vec<RawRecord>) -> NormalizedBatch {
        let total = raws.len();
        let mut batch = NormalizedBatch::default();
        for raw in raws {
            match self.normalize(&raw) {
                Ok(record) => batch.records.push(record),
                Err(rejection) => {
                    debug!("skipping {rejection}");
                    batch.rejections.push(rejection);
                }
            }
        }
        info!(
            "normalised {} of {total} records ({} skipped)",
            batch.records.len(),
            batch.rejections.len()
        );
        batch
    }

    /// Re-apply string normalisation to an already canonical record.
    ///
    /// Category, confidences, coordinates and reviews are kept as they are.
    /// Applying this to the output of [`Normalizer::normalize`] returns the
    /// record unchanged.
    #[must_use]
    pub fn renormalize(&self, record: &CanonicalRecord) -> CanonicalRecord {
        let name = display_name(&record.name).unwrap_or_else(|| record.name.clone());
        CanonicalRecord {
            name_key: name_key(&name),
            name,
            street: record.street.as_deref().and_then(normalize_street),
            city: record.city.as_deref().and_then(normalize_city),
            state: record.state.as_deref().and_then(normalize_state),
            zip: record.zip.as_deref().and_then(normalize_zip),
            phone: record.phone.as_deref().and_then(normalize_phone),
            website: record
                .website
                .as_deref()
                .map(str::trim)
                .filter(|website| !website.is_empty())
                .map(str::to_owned),
            ..record.clone()
        }
    }
}
