//! Property-based tests for the merge engine.
//!
//! # Invariants tested
//!
//! - **Partition:** every input record appears in exactly one entity.
//! - **Order independence:** shuffling the input does not change the output.
//! - **Link floor:** every pair inside a merged entity scores at least the
//!   link floor.
//! - **Stable ids:** each cluster id is derived from its member keys.

use corral_core::test_support::RecordBuilder;
use corral_core::{CanonicalRecord, ClusterId, MergeConfig, PairScorer, RecordKey, SourceId};
use corral_dedup::{MergeEngine, aggregate};
use corral_matcher::SimilarityMatcher;
use proptest::prelude::*;

const NAMES: [&str; 4] = ["boot barn", "cavenders", "western wear", "hat ranch"];
const CITIES: [&str; 3] = ["Amarillo", "Abilene", "Lubbock"];
const SOURCES: [SourceId; 3] = [SourceId::Osm, SourceId::Yelp, SourceId::GooglePlaces];

type Listing = (SourceId, &'static str, &'static str, Option<(f64, f64)>);

fn listing_strategy() -> impl Strategy<Value = Listing> {
    (
        prop::sample::select(SOURCES.to_vec()),
        prop::sample::select(NAMES.to_vec()),
        prop::sample::select(CITIES.to_vec()),
        // A small box so nearby listings share spatial buckets.
        prop::option::of((-101.84_f64..-101.82, 35.21_f64..35.23)),
    )
}

fn build(listings: &[Listing]) -> Vec<CanonicalRecord> {
    listings
        .iter()
        .enumerate()
        .map(|(index, (source, name, city, location))| {
            let mut builder =
                RecordBuilder::new(*source, format!("listing-{index}"), *name).locality(*city, "TX");
            if let Some((lon, lat)) = location {
                builder = builder.at(*lon, *lat, 0.9);
            }
            builder.build()
        })
        .collect()
}

fn engine() -> MergeEngine<SimilarityMatcher> {
    MergeEngine::new(SimilarityMatcher::default(), MergeConfig::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn every_record_lands_in_one_entity(
        listings in prop::collection::vec(listing_strategy(), 0..12),
    ) {
        let records = build(&listings);
        let mut expected: Vec<RecordKey> = records.iter().map(|r| r.key.clone()).collect();
        expected.sort();
        let entities = engine().merge(records);
        let mut seen: Vec<RecordKey> = entities
            .iter()
            .flat_map(|entity| entity.member_keys().cloned())
            .collect();
        seen.sort();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn input_order_does_not_matter(
        (ordered, shuffled) in prop::collection::vec(listing_strategy(), 0..12)
            .prop_map(|listings| build(&listings))
            .prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle())),
    ) {
        let forward = aggregate(engine().merge(ordered));
        let backward = aggregate(engine().merge(shuffled));
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn merged_members_clear_the_link_floor(
        listings in prop::collection::vec(listing_strategy(), 0..12),
    ) {
        let config = MergeConfig::default();
        let matcher = SimilarityMatcher::default();
        for entity in engine().merge(build(&listings)) {
            for (index, a) in entity.members.iter().enumerate() {
                for b in entity.members.iter().skip(index + 1) {
                    let score = matcher.score(a, b).total;
                    prop_assert!(score >= config.link_floor, "{} ~ {} scored {score}", a.key, b.key);
                }
            }
        }
    }

    #[test]
    fn cluster_ids_follow_membership(
        listings in prop::collection::vec(listing_strategy(), 0..12),
    ) {
        for entity in engine().merge(build(&listings)) {
            prop_assert_eq!(entity.id.clone(), ClusterId::from_members(entity.member_keys()));
        }
    }
}
