//! Field merge policy and entity assembly.
//!
//! For each field the policy keeps the candidates whose confidence lies within
//! the tolerance of the best one, prefers the highest-ranked source among
//! them, and within that source rank takes the most confident value. Values
//! that still disagree at equal rank and equal confidence go to the configured
//! [`TieBreak`] rule.
//!
//! Coordinates are stricter: the most confident one wins outright and rank
//! only separates exact ties. When a comparably confident rival lies beyond
//! the ambiguity radius the entity is flagged.

use std::collections::{BTreeMap, BTreeSet};

use corral_core::{
    Attributed, CanonicalRecord, ClusterId, FieldConfidence, MergeConfig, MergeField,
    MergedEntity, MergedFields, RecordKey, ReviewReason, ReviewSummary, ScoreRange, SourceId,
    TieBreak,
};
use geo::{Coord, Distance, Haversine, Point};

/// One record's offer for a field.
#[derive(Debug)]
struct Candidate<'a, T> {
    value: T,
    record: &'a CanonicalRecord,
    confidence: f64,
}

/// Outcome of settling one field.
#[derive(Debug)]
struct Settled<T> {
    value: Attributed<T>,
    unsettled: bool,
}

#[expect(
    clippy::float_arithmetic,
    reason = "comparable confidences lie within a tolerance of the best"
)]
const fn comparable_floor(best: f64, tolerance: f64) -> f64 {
    best - tolerance
}

fn best_confidence<T>(candidates: &[Candidate<'_, T>]) -> Option<f64> {
    candidates
        .iter()
        .map(|candidate| candidate.confidence)
        .max_by(f64::total_cmp)
}

/// Choose among candidates listed in record-key order, treating confidences
/// within `tolerance` of the best as comparable.
fn settle<T: PartialEq>(
    candidates: Vec<Candidate<'_, T>>,
    tolerance: f64,
    config: &MergeConfig,
) -> Option<Settled<T>> {
    let best = best_confidence(&candidates)?;
    let floor = comparable_floor(best, tolerance);
    let top_rank = candidates
        .iter()
        .filter(|candidate| candidate.confidence >= floor)
        .map(|candidate| config.rank(candidate.record.source()))
        .min()?;
    let contenders: Vec<Candidate<'_, T>> = candidates
        .into_iter()
        .filter(|candidate| {
            candidate.confidence >= floor && config.rank(candidate.record.source()) == top_rank
        })
        .collect();
    let peak = contenders
        .iter()
        .map(|candidate| candidate.confidence)
        .max_by(f64::total_cmp)?;
    let leaders: Vec<Candidate<'_, T>> = contenders
        .into_iter()
        .filter(|candidate| candidate.confidence.total_cmp(&peak).is_eq())
        .collect();
    let unsettled = leaders
        .first()
        .is_some_and(|first| leaders.iter().any(|other| other.value != first.value));
    let winner = if unsettled && config.tie_break == TieBreak::MostRecent {
        leaders
            .into_iter()
            .rev()
            .max_by_key(|candidate| candidate.record.retrieved_at)?
    } else {
        leaders.into_iter().next()?
    };
    Some(Settled {
        value: Attributed {
            value: winner.value,
            source: winner.record.key.clone(),
            confidence: winner.confidence,
        },
        unsettled: unsettled && config.tie_break == TieBreak::FlagForReview,
    })
}

/// Settles every field of one cluster, remembering unsettled conflicts.
struct FieldMerger<'a> {
    members: &'a [CanonicalRecord],
    config: &'a MergeConfig,
    unsettled: Vec<MergeField>,
    location_spread: Option<f64>,
}

impl<'a> FieldMerger<'a> {
    const fn new(members: &'a [CanonicalRecord], config: &'a MergeConfig) -> Self {
        Self {
            members,
            config,
            unsettled: Vec::new(),
            location_spread: None,
        }
    }

    fn candidates<T>(
        &self,
        value: impl Fn(&'a CanonicalRecord) -> Option<T>,
        confidence: impl Fn(&FieldConfidence) -> f64,
    ) -> Vec<Candidate<'a, T>> {
        self.members
            .iter()
            .filter_map(|record| {
                value(record).map(|found| Candidate {
                    value: found,
                    record,
                    confidence: confidence(&record.confidence),
                })
            })
            .collect()
    }

    fn pick<T: PartialEq>(
        &mut self,
        field: MergeField,
        value: impl Fn(&'a CanonicalRecord) -> Option<T>,
        confidence: impl Fn(&FieldConfidence) -> f64,
    ) -> Option<Attributed<T>> {
        let candidates = self.candidates(value, confidence);
        let settled = settle(candidates, self.config.confidence_tolerance, self.config)?;
        if settled.unsettled {
            self.unsettled.push(field);
        }
        Some(settled.value)
    }

    /// Most confident coordinate; rivals within the tolerance that lie beyond
    /// the ambiguity radius are remembered as a spread.
    fn location(&mut self) -> Option<Attributed<Coord>> {
        let candidates = self.candidates(|record| record.location, |c| c.location);
        let floor = comparable_floor(
            best_confidence(&candidates)?,
            self.config.confidence_tolerance,
        );
        let rivals: Vec<Coord> = candidates
            .iter()
            .filter(|candidate| candidate.confidence >= floor)
            .map(|candidate| candidate.value)
            .collect();
        let settled = settle(candidates, 0.0, self.config)?;
        if settled.unsettled {
            self.unsettled.push(MergeField::Location);
        }
        let chosen = Point::from(settled.value.value);
        let spread = rivals
            .into_iter()
            .map(|rival| Haversine.distance(chosen, Point::from(rival)))
            .fold(0.0, f64::max);
        if spread > self.config.ambiguity_radius_m {
            self.location_spread = Some(spread);
        }
        Some(settled.value)
    }

    fn text(
        &mut self,
        field: MergeField,
        value: impl Fn(&'a CanonicalRecord) -> Option<&'a String>,
        confidence: impl Fn(&FieldConfidence) -> f64,
    ) -> Option<Attributed<String>> {
        self.pick(field, |record| value(record).cloned(), confidence)
    }

    fn fields(&mut self) -> Option<MergedFields> {
        Some(MergedFields {
            name: self.pick(MergeField::Name, |r| Some(r.name.clone()), |c| c.name)?,
            street: self.text(MergeField::Street, |r| r.street.as_ref(), |c| c.address),
            city: self.text(MergeField::City, |r| r.city.as_ref(), |c| c.address),
            state: self.text(MergeField::State, |r| r.state.as_ref(), |c| c.address),
            zip: self.text(MergeField::Zip, |r| r.zip.as_ref(), |c| c.address),
            phone: self.text(MergeField::Phone, |r| r.phone.as_ref(), |c| c.phone),
            website: self.text(MergeField::Website, |r| r.website.as_ref(), |c| c.name),
            category: self.pick(MergeField::Category, |r| Some(r.category), |c| c.category)?,
            location: self.location(),
        })
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "entity confidence is the mean of the chosen field confidences"
)]
fn mean_confidence(fields: &MergedFields) -> f64 {
    let optional = [
        &fields.street,
        &fields.city,
        &fields.state,
        &fields.zip,
        &fields.phone,
        &fields.website,
    ];
    let mut confidences: Vec<f64> = vec![fields.name.confidence, fields.category.confidence];
    confidences.extend(optional.iter().filter_map(|field| field.as_ref().map(|a| a.confidence)));
    confidences.extend(fields.location.as_ref().map(|a| a.confidence));
    confidences.iter().sum::<f64>() / confidences.len() as f64
}

fn merged_reviews(members: &[CanonicalRecord]) -> BTreeMap<SourceId, ReviewSummary> {
    let mut reviews: BTreeMap<SourceId, ReviewSummary> = BTreeMap::new();
    for record in members {
        let Some(summary) = record.reviews else {
            continue;
        };
        reviews
            .entry(record.source())
            .and_modify(|kept| {
                if summary.count > kept.count {
                    *kept = summary;
                }
            })
            .or_insert(summary);
    }
    reviews
}

fn review_reasons(
    members: &[CanonicalRecord],
    score_range: Option<ScoreRange>,
    merger: FieldMerger<'_>,
    config: &MergeConfig,
) -> Vec<ReviewReason> {
    let mut reasons = Vec::new();
    if let Some(range) = score_range.filter(|range| range.spread() > config.review_spread) {
        reasons.push(ReviewReason::ScoreSpread {
            spread: range.spread(),
        });
    }
    reasons.extend(
        members
            .iter()
            .filter(|record| record.geocode.is_ambiguous())
            .map(|record| ReviewReason::AmbiguousLocation {
                record: record.key.clone(),
            }),
    );
    reasons.extend(
        merger
            .location_spread
            .map(|spread_m| ReviewReason::ConflictingLocations { spread_m }),
    );
    reasons.extend(
        merger
            .unsettled
            .into_iter()
            .map(|field| ReviewReason::UnsettledConflict { field }),
    );
    reasons
}

/// Assemble an entity from cluster members sorted by key.
///
/// Returns `None` only for an empty member list.
pub(crate) fn build_entity(
    members: Vec<CanonicalRecord>,
    score_range: Option<ScoreRange>,
    config: &MergeConfig,
) -> Option<MergedEntity> {
    let mut merger = FieldMerger::new(&members, config);
    let fields = merger.fields()?;
    let reasons = review_reasons(&members, score_range, merger, config);
    let keys: Vec<&RecordKey> = members.iter().map(|record| &record.key).collect();
    let id = ClusterId::from_members(keys);
    let categories: BTreeSet<String> = members
        .iter()
        .flat_map(|record| record.provider_categories.iter().cloned())
        .collect();
    let reviews = merged_reviews(&members);
    Some(MergedEntity {
        id,
        confidence: mean_confidence(&fields),
        fields,
        categories,
        reviews,
        score_range,
        review_reasons: reasons,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::test_support::RecordBuilder;
    use corral_core::{Category, FieldConfidence};
    use rstest::{fixture, rstest};

    fn confidence(name: f64, address: f64, phone: f64) -> FieldConfidence {
        FieldConfidence {
            name,
            address,
            phone,
            category: 0.8,
            location: 0.0,
        }
    }

    #[fixture]
    fn config() -> MergeConfig {
        MergeConfig::default()
    }

    #[rstest]
    fn ranked_source_wins_when_confidences_are_comparable(config: MergeConfig) {
        let members = vec![
            RecordBuilder::new(SourceId::Osm, "node/1", "Boot Barn")
                .confidence(confidence(0.85, 0.8, 0.0))
                .build(),
            RecordBuilder::new(SourceId::Yelp, "y", "BOOT BARN #4521")
                .confidence(confidence(0.9, 0.8, 0.0))
                .build(),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        assert_eq!(entity.fields.name.value, "Boot Barn");
        assert_eq!(entity.fields.name.source.source, SourceId::Osm);
        assert!(!entity.needs_review());
    }

    #[rstest]
    fn clearly_more_confident_value_wins(config: MergeConfig) {
        let members = vec![
            RecordBuilder::new(SourceId::Osm, "node/1", "Boot Barn")
                .phone("8175550199")
                .confidence(confidence(0.9, 0.8, 0.4))
                .build(),
            RecordBuilder::new(SourceId::Yelp, "y", "Boot Barn")
                .phone("8175550100")
                .confidence(confidence(0.9, 0.8, 0.9))
                .build(),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        let phone = entity.fields.phone.expect("phone");
        assert_eq!(phone.value, "8175550100");
        assert_eq!(phone.source, RecordKey::new(SourceId::Yelp, "y"));
    }

    fn twins() -> Vec<CanonicalRecord> {
        vec![
            RecordBuilder::new(SourceId::Yelp, "a", "Boot Barn")
                .phone("8175550100")
                .retrieved_at(10)
                .build(),
            RecordBuilder::new(SourceId::Yelp, "b", "Boot Barn")
                .phone("8175550199")
                .retrieved_at(20)
                .build(),
        ]
    }

    #[rstest]
    #[case(TieBreak::FirstListed, "8175550100", false)]
    #[case(TieBreak::MostRecent, "8175550199", false)]
    #[case(TieBreak::FlagForReview, "8175550100", true)]
    fn tie_break_settles_equal_conflicts(
        config: MergeConfig,
        #[case] rule: TieBreak,
        #[case] phone: &str,
        #[case] flagged: bool,
    ) {
        let entity =
            build_entity(twins(), None, &config.with_tie_break(rule)).expect("entity");
        assert_eq!(entity.fields.phone.expect("phone").value, phone);
        let conflict = ReviewReason::UnsettledConflict {
            field: MergeField::Phone,
        };
        assert_eq!(entity.review_reasons.contains(&conflict), flagged);
    }

    #[rstest]
    fn agreeing_values_are_not_conflicts(config: MergeConfig) {
        let entity = build_entity(twins(), None, &config).expect("entity");
        assert!(
            !entity
                .review_reasons
                .contains(&ReviewReason::UnsettledConflict {
                    field: MergeField::Name
                })
        );
    }

    #[rstest]
    fn wide_score_spread_is_flagged(config: MergeConfig) {
        let members = vec![RecordBuilder::new(SourceId::Osm, "a", "Boot Barn").build()];
        let range = ScoreRange { min: 0.5, max: 0.95 };
        let entity = build_entity(members, Some(range), &config).expect("entity");
        assert!(matches!(
            entity.review_reasons.as_slice(),
            [ReviewReason::ScoreSpread { .. }]
        ));
    }

    #[rstest]
    fn ambiguous_member_is_flagged(config: MergeConfig) {
        let members = vec![
            RecordBuilder::new(SourceId::Yelp, "y", "Cavenders")
                .ambiguous(2)
                .build(),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        assert_eq!(
            entity.review_reasons,
            vec![ReviewReason::AmbiguousLocation {
                record: RecordKey::new(SourceId::Yelp, "y")
            }]
        );
    }

    #[rstest]
    fn unions_categories_and_keeps_busiest_reviews(config: MergeConfig) {
        let members = vec![
            RecordBuilder::new(SourceId::Yelp, "a", "Boot Barn")
                .provider_category("Shoe Stores")
                .reviews(4.0, 10)
                .category(Category::BootShop)
                .build(),
            RecordBuilder::new(SourceId::Yelp, "b", "Boot Barn")
                .provider_category("Western Wear")
                .reviews(4.5, 120)
                .category(Category::BootShop)
                .build(),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        assert_eq!(entity.categories.len(), 2);
        assert_eq!(
            entity.reviews.get(&SourceId::Yelp).map(|r| r.count),
            Some(120)
        );
        assert_eq!(entity.members.len(), 2);
    }

    fn located(source: SourceId, key: &str, lon: f64, confidence: f64) -> CanonicalRecord {
        RecordBuilder::new(source, key, "Boot Barn")
            .at(lon, 32.75, confidence)
            .build()
    }

    #[rstest]
    fn most_confident_location_wins_over_rank(config: MergeConfig) {
        let members = vec![
            located(SourceId::GooglePlaces, "g", -97.330_0, 0.9),
            located(SourceId::Yelp, "y", -97.330_2, 0.85),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        let location = entity.fields.location.as_ref().expect("location");
        assert_eq!(location.source, RecordKey::new(SourceId::GooglePlaces, "g"));
        assert!(!entity.needs_review());
    }

    #[rstest]
    fn rank_separates_equally_confident_locations(config: MergeConfig) {
        let members = vec![
            located(SourceId::GooglePlaces, "g", -97.330_0, 0.9),
            located(SourceId::Osm, "node/1", -97.330_1, 0.9),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        let location = entity.fields.location.expect("location");
        assert_eq!(location.source.source, SourceId::Osm);
    }

    #[rstest]
    fn distant_comparable_locations_are_flagged(config: MergeConfig) {
        // About 9 km apart at this latitude.
        let members = vec![
            located(SourceId::GooglePlaces, "g", -97.33, 0.9),
            located(SourceId::Yelp, "y", -97.24, 0.85),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        let location = entity.fields.location.as_ref().expect("location");
        assert_eq!(location.source.source, SourceId::GooglePlaces);
        assert!(matches!(
            entity.review_reasons.as_slice(),
            [ReviewReason::ConflictingLocations { spread_m }] if *spread_m > 8_000.0
        ));
    }

    #[rstest]
    fn distant_but_much_weaker_location_is_not_a_rival(config: MergeConfig) {
        let members = vec![
            located(SourceId::GooglePlaces, "g", -97.33, 0.9),
            located(SourceId::Yelp, "y", -97.24, 0.4),
        ];
        let entity = build_entity(members, None, &config).expect("entity");
        assert!(!entity.needs_review());
    }

    #[rstest]
    fn empty_cluster_builds_nothing(config: MergeConfig) {
        assert!(build_entity(Vec::new(), None, &config).is_none());
    }
}
