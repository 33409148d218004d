//! Weighted pair scorer combining name, address and distance.

use corral_core::{CanonicalRecord, MatchConfig, MatchScore, PairScorer};

use crate::address::address_similarity;
use crate::spatial::{distance_m, spatial_credit};
use crate::text::token_set_similarity;

/// Default [`PairScorer`] for the merge engine.
///
/// Name similarity is the token-set ratio of the match keys. When both
/// records are located, the total is `name_weight * name + address_weight *
/// address + spatial_weight * spatial`; otherwise the fallback name and
/// address weights apply and no spatial credit is given. Two fetches of the
/// same listing always score `1.0`.
///
/// # Examples
///
/// ```
/// use corral_core::{MatchConfig, PairScorer, SourceId};
/// use corral_core::test_support::RecordBuilder;
/// use corral_matcher::SimilarityMatcher;
///
/// let a = RecordBuilder::new(SourceId::Osm, "node/1", "Boot Barn")
///     .at(-97.33, 32.75, 0.95)
///     .build();
/// let b = RecordBuilder::new(SourceId::Yelp, "bb-fw", "BOOT BARN")
///     .at(-97.33, 32.7502, 0.85)
///     .build();
/// let score = SimilarityMatcher::new(MatchConfig::default()).score(&a, &b);
/// assert!(score.total > 0.6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher {
    config: MatchConfig,
}

impl SimilarityMatcher {
    /// Build a matcher with explicit weights and decay distances.
    #[must_use]
    pub const fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    /// Weights and decay distances in use.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }
}

impl PairScorer for SimilarityMatcher {
    #[expect(
        clippy::float_arithmetic,
        reason = "weighted sum of the similarity components"
    )]
    fn score(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> MatchScore {
        if a.key == b.key {
            return MatchScore::certain();
        }
        let name = token_set_similarity(&a.name_key, &b.name_key);
        let address = address_similarity(a, b);
        let cfg = &self.config;
        let (total, spatial, distance) = match (a.location, b.location) {
            (Some(left), Some(right)) => {
                let metres = distance_m(left, right);
                let credit = spatial_credit(metres, cfg.full_credit_m, cfg.zero_credit_m);
                let weighted = cfg.name_weight * name
                    + cfg.address_weight * address
                    + cfg.spatial_weight * credit;
                (weighted, Some(credit), Some(metres))
            }
            _ => (
                cfg.fallback_name_weight * name + cfg.fallback_address_weight * address,
                None,
                None,
            ),
        };
        MatchScore {
            total: Self::sanitise(total),
            name,
            address,
            spatial,
            distance_m: distance,
        }
    }

    fn spatial_reach_m(&self) -> Option<f64> {
        Some(self.config.zero_credit_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::SourceId;
    use corral_core::test_support::RecordBuilder;
    use rstest::{fixture, rstest};

    #[fixture]
    fn matcher() -> SimilarityMatcher {
        SimilarityMatcher::default()
    }

    #[rstest]
    fn same_listing_scores_one(matcher: SimilarityMatcher) {
        let a = RecordBuilder::new(SourceId::Yelp, "x", "Boot Barn").build();
        let b = RecordBuilder::new(SourceId::Yelp, "x", "Something Else").build();
        assert_eq!(matcher.score(&a, &b), MatchScore::certain());
    }

    #[rstest]
    fn unlocated_pair_uses_fallback_weights(matcher: SimilarityMatcher) {
        let a = RecordBuilder::new(SourceId::Yelp, "a", "Boot Barn")
            .locality("Amarillo", "TX")
            .build();
        let b = RecordBuilder::new(SourceId::BootBarn, "b", "Boot Barn")
            .locality("Amarillo", "TX")
            .at(-101.83, 35.22, 0.6)
            .build();
        let score = matcher.score(&a, &b);
        assert_eq!(score.spatial, None);
        assert_eq!(score.distance_m, None);
        assert!((score.total - 1.0).abs() < 1e-9, "got {}", score.total);
    }

    #[rstest]
    fn reach_is_the_zero_credit_distance(matcher: SimilarityMatcher) {
        assert_eq!(matcher.spatial_reach_m(), Some(500.0));
    }

    #[rstest]
    fn distant_namesakes_stay_below_threshold(matcher: SimilarityMatcher) {
        let a = RecordBuilder::new(SourceId::Osm, "node/1", "Western Wear Co")
            .name_key("western wear")
            .locality("Abilene", "TX")
            .at(-99.73, 32.45, 0.95)
            .build();
        let b = RecordBuilder::new(SourceId::Yelp, "ww", "Western Wear Co")
            .name_key("western wear")
            .locality("Lubbock", "TX")
            .at(-101.85, 33.58, 0.85)
            .build();
        let score = matcher.score(&a, &b);
        assert_eq!(score.spatial, Some(0.0));
        assert!(score.total < 0.75, "got {}", score.total);
    }
}
