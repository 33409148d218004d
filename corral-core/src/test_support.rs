//! Builders for canonical records and entities used by unit and behaviour
//! tests across the workspace.

use std::collections::{BTreeMap, BTreeSet};

use geo::Coord;

use crate::{
    Attributed, CanonicalRecord, Category, ClusterId, FieldConfidence, GeocodeStatus,
    MergedEntity, MergedFields, RecordKey, ReviewSummary, SourceId, UnresolvedReason,
};

/// Fluent builder for [`CanonicalRecord`] fixtures.
///
/// The match key defaults to the lower-cased alphanumeric words of the name;
/// tests that need the normaliser's full key should set it explicitly.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: CanonicalRecord,
}

impl RecordBuilder {
    /// Start a record with a name and no address.
    pub fn new(source: SourceId, key: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let name_key = name
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            record: CanonicalRecord {
                key: RecordKey::new(source, key),
                retrieved_at: 0,
                name,
                name_key,
                street: None,
                city: None,
                state: None,
                zip: None,
                phone: None,
                website: None,
                category: Category::Mixed,
                provider_categories: BTreeSet::new(),
                reviews: None,
                location: None,
                geocode: GeocodeStatus::Unresolved {
                    reason: UnresolvedReason::GeocodeUnavailable,
                },
                confidence: FieldConfidence {
                    name: 0.9,
                    address: 0.8,
                    phone: 0.0,
                    category: 0.5,
                    location: 0.0,
                },
            },
        }
    }

    /// Override the match key.
    #[must_use]
    pub fn name_key(mut self, name_key: impl Into<String>) -> Self {
        self.record.name_key = name_key.into();
        self
    }

    /// Set the street line.
    #[must_use]
    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.record.street = Some(street.into());
        self
    }

    /// Set city and state.
    #[must_use]
    pub fn locality(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.record.city = Some(city.into());
        self.record.state = Some(state.into());
        self
    }

    /// Set the ZIP code.
    #[must_use]
    pub fn zip(mut self, zip: impl Into<String>) -> Self {
        self.record.zip = Some(zip.into());
        self
    }

    /// Set the phone number with high confidence.
    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.record.phone = Some(phone.into());
        self.record.confidence.phone = 0.9;
        self
    }

    /// Set the website.
    #[must_use]
    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.record.website = Some(website.into());
        self
    }

    /// Provide coordinates with the given confidence.
    #[must_use]
    pub fn at(mut self, lon: f64, lat: f64, confidence: f64) -> Self {
        self.record.location = Some(Coord { x: lon, y: lat });
        self.record.confidence.location = confidence;
        self.record.geocode = GeocodeStatus::Provided;
        self
    }

    /// Mark the record ambiguous.
    #[must_use]
    pub fn ambiguous(mut self, candidates: usize) -> Self {
        self.record.location = None;
        self.record.confidence.location = 0.0;
        self.record.geocode = GeocodeStatus::Unresolved {
            reason: UnresolvedReason::AmbiguousLocation { candidates },
        };
        self
    }

    /// Set the category.
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.record.category = category;
        self
    }

    /// Add a provider category label.
    #[must_use]
    pub fn provider_category(mut self, label: impl Into<String>) -> Self {
        self.record.provider_categories.insert(label.into());
        self
    }

    /// Set rating and review count.
    #[must_use]
    pub const fn reviews(mut self, rating: f64, count: u32) -> Self {
        self.record.reviews = Some(ReviewSummary {
            rating: Some(rating),
            count,
        });
        self
    }

    /// Set the retrieval timestamp.
    #[must_use]
    pub const fn retrieved_at(mut self, retrieved_at: u64) -> Self {
        self.record.retrieved_at = retrieved_at;
        self
    }

    /// Override the per-field confidence.
    #[must_use]
    pub const fn confidence(mut self, confidence: FieldConfidence) -> Self {
        self.record.confidence = confidence;
        self
    }

    /// Finish the record.
    #[must_use]
    pub fn build(self) -> CanonicalRecord {
        self.record
    }
}

/// Wrap one record in an entity without running the merge engine.
#[must_use]
pub fn singleton_entity(record: CanonicalRecord) -> MergedEntity {
    let key = record.key.clone();
    let confidence = record.confidence;
    let attributed = |value: &Option<String>, field_confidence: f64| {
        value.clone().map(|value| Attributed {
            value,
            source: key.clone(),
            confidence: field_confidence,
        })
    };
    let fields = MergedFields {
        name: Attributed {
            value: record.name.clone(),
            source: key.clone(),
            confidence: confidence.name,
        },
        street: attributed(&record.street, confidence.address),
        city: attributed(&record.city, confidence.address),
        state: attributed(&record.state, confidence.address),
        zip: attributed(&record.zip, confidence.address),
        phone: attributed(&record.phone, confidence.phone),
        website: attributed(&record.website, confidence.name),
        category: Attributed {
            value: record.category,
            source: key.clone(),
            confidence: confidence.category,
        },
        location: record.location.map(|value| Attributed {
            value,
            source: key.clone(),
            confidence: confidence.location,
        }),
    };
    let reviews: BTreeMap<SourceId, ReviewSummary> = record
        .reviews
        .map(|summary| (record.source(), summary))
        .into_iter()
        .collect();
    MergedEntity {
        id: ClusterId::from_members([&key]),
        categories: record.provider_categories.clone(),
        members: vec![record],
        fields,
        reviews,
        confidence: confidence.name,
        score_range: None,
        review_reasons: Vec::new(),
    }
}
