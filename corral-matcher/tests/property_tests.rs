//! Property-based tests for the similarity matcher.
//!
//! # Invariants tested
//!
//! - **Symmetry:** `score(a, b) == score(b, a)` for every component.
//! - **Range:** totals are finite and lie in `0.0..=1.0`.
//! - **Reflexivity:** a record scores `1.0` against itself.

use corral_core::test_support::RecordBuilder;
use corral_core::{CanonicalRecord, PairScorer, SourceId};
use corral_matcher::SimilarityMatcher;
use proptest::prelude::*;

const WORDS: [&str; 8] = [
    "boot", "barn", "western", "wear", "cavenders", "ranch", "hat", "tack",
];
const CITIES: [&str; 4] = ["Amarillo", "Abilene", "Fort Worth", "Lubbock"];

fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..4)
        .prop_map(|words| words.join(" "))
}

fn record_strategy(source: SourceId, key: &'static str) -> impl Strategy<Value = CanonicalRecord> {
    (
        name_strategy(),
        prop::option::of(1_u32..500),
        prop::option::of(prop::sample::select(CITIES.to_vec())),
        prop::option::of((-101.9_f64..-97.0, 32.0_f64..35.5)),
    )
        .prop_map(move |(name, house, city, location)| {
            let mut builder = RecordBuilder::new(source, key, name);
            if let Some(number) = house {
                builder = builder.street(format!("{number} main street"));
            }
            if let Some(town) = city {
                builder = builder.locality(town, "TX");
            }
            if let Some((lon, lat)) = location {
                builder = builder.at(lon, lat, 0.9);
            }
            builder.build()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: swapping the arguments never changes the score.
    #[test]
    fn scoring_is_symmetric(
        a in record_strategy(SourceId::Osm, "node/1"),
        b in record_strategy(SourceId::Yelp, "yelp-1"),
    ) {
        let matcher = SimilarityMatcher::default();
        let ab = matcher.score(&a, &b);
        let ba = matcher.score(&b, &a);
        prop_assert_eq!(ab, ba);
    }

    /// Property: totals are finite and normalised.
    #[test]
    fn totals_are_in_range(
        a in record_strategy(SourceId::GooglePlaces, "g-1"),
        b in record_strategy(SourceId::BootBarn, "bb-1"),
    ) {
        let total = SimilarityMatcher::default().score(&a, &b).total;
        prop_assert!(total.is_finite());
        prop_assert!((0.0..=1.0).contains(&total));
    }

    /// Property: a record is a perfect match for itself.
    #[test]
    fn self_match_is_certain(a in record_strategy(SourceId::Cavenders, "c-1")) {
        let total = SimilarityMatcher::default().score(&a, &a).total;
        prop_assert!((total - 1.0).abs() < f64::EPSILON);
    }
}
