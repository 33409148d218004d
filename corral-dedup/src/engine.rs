//! Clustering and merging a batch of resolved records.

use std::collections::HashMap;

use corral_core::{
    CanonicalRecord, MergeConfig, MergedEntity, PairScorer, RecordKey, ScoreRange,
};
use log::{debug, info};

use crate::bucket::{Pair, candidate_pairs};
use crate::merge::build_entity;
use crate::union_find::UnionFind;

/// Groups records describing the same store into [`MergedEntity`]s.
///
/// Each call to [`MergeEngine::merge`] runs an independent pass that owns
/// its records, its score cache and its union-find.
///
/// # Examples
///
/// ```
/// use corral_core::{CanonicalRecord, MatchScore, MergeConfig, PairScorer};
/// use corral_dedup::MergeEngine;
///
/// struct NeverMatch;
///
/// impl PairScorer for NeverMatch {
///     fn score(&self, _: &CanonicalRecord, _: &CanonicalRecord) -> MatchScore {
///         MatchScore { total: 0.0, name: 0.0, address: 0.0, spatial: None, distance_m: None }
///     }
/// }
///
/// let engine = MergeEngine::new(NeverMatch, MergeConfig::default());
/// assert!(engine.merge(Vec::new()).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MergeEngine<S> {
    scorer: S,
    config: MergeConfig,
}

impl<S: PairScorer> MergeEngine<S> {
    /// Engine scoring pairs with `scorer` under `config`.
    #[must_use]
    pub const fn new(scorer: S, config: MergeConfig) -> Self {
        Self { scorer, config }
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Cluster and merge `records`.
    ///
    /// Every input record ends up in exactly one entity. The result does not
    /// depend on input order; entities come back ordered by their smallest
    /// member key.
    #[must_use]
    pub fn merge(&self, mut records: Vec<CanonicalRecord>) -> Vec<MergedEntity> {
        records.sort_by_cached_key(content_order);
        let total = records.len();
        let entities = MergePass::new(&self.scorer, &self.config, records).run();
        let flagged = entities.iter().filter(|entity| entity.needs_review()).count();
        info!(
            "merged {total} records into {} entities ({flagged} flagged for review)",
            entities.len()
        );
        entities
    }
}

/// Sort key placing records in one order whatever order they arrived in.
///
/// Key and retrieval time come first; the serialised record settles
/// refetches that share both.
fn content_order(record: &CanonicalRecord) -> (RecordKey, u64, String) {
    (
        record.key.clone(),
        record.retrieved_at,
        serde_json::to_string(record).unwrap_or_default(),
    )
}

/// State of one merge pass.
struct MergePass<'a, S> {
    scorer: &'a S,
    config: &'a MergeConfig,
    records: Vec<CanonicalRecord>,
    scores: HashMap<Pair, f64>,
    sets: UnionFind,
}

impl<'a, S: PairScorer> MergePass<'a, S> {
    fn new(scorer: &'a S, config: &'a MergeConfig, records: Vec<CanonicalRecord>) -> Self {
        let sets = UnionFind::new(records.len());
        Self {
            scorer,
            config,
            records,
            scores: HashMap::new(),
            sets,
        }
    }

    fn run(mut self) -> Vec<MergedEntity> {
        let config = self.config;
        for (a, b) in self.edges() {
            self.link(a, b);
        }
        let sets = std::mem::replace(&mut self.sets, UnionFind::new(0)).into_sets();
        let ranges: Vec<Option<ScoreRange>> =
            sets.iter().map(|set| self.score_range(set)).collect();
        let mut slots: Vec<Option<CanonicalRecord>> =
            std::mem::take(&mut self.records).into_iter().map(Some).collect();
        sets.into_iter()
            .zip(ranges)
            .filter_map(|(set, range)| {
                let members: Vec<CanonicalRecord> = set
                    .into_iter()
                    .filter_map(|index| slots.get_mut(index).and_then(Option::take))
                    .collect();
                build_entity(members, range, config)
            })
            .collect()
    }

    /// Candidate pairs at or above the threshold, best first, then by key.
    fn edges(&mut self) -> Vec<Pair> {
        let threshold = self.config.threshold;
        let pairs = candidate_pairs(
            &self.records,
            self.config.bucket_size_m,
            self.scorer.spatial_reach_m(),
        );
        let mut edges: Vec<(f64, Pair)> = pairs
            .into_iter()
            .map(|pair| (self.score(pair.0, pair.1), pair))
            .filter(|(score, _)| *score >= threshold)
            .collect();
        edges.sort_by(|(left_score, left), (right_score, right)| {
            right_score
                .total_cmp(left_score)
                .then_with(|| left.cmp(right))
        });
        edges.into_iter().map(|(_, pair)| pair).collect()
    }

    /// Cached pair score; `0.0` for indices outside the batch.
    fn score(&mut self, a: usize, b: usize) -> f64 {
        let pair = if a < b { (a, b) } else { (b, a) };
        if let Some(score) = self.scores.get(&pair) {
            return *score;
        }
        let total = match (self.records.get(pair.0), self.records.get(pair.1)) {
            (Some(left), Some(right)) => self.scorer.score(left, right).total,
            _ => 0.0,
        };
        self.scores.insert(pair, total);
        total
    }

    /// Join the sets of `a` and `b` unless some cross pair scores below the
    /// link floor.
    fn link(&mut self, a: usize, b: usize) {
        let left_root = self.sets.find(a);
        let right_root = self.sets.find(b);
        if left_root == right_root {
            return;
        }
        let left = self.sets.members(left_root).to_vec();
        let right = self.sets.members(right_root).to_vec();
        for &x in &left {
            for &y in &right {
                if self.score(x, y) < self.config.link_floor {
                    debug!(
                        "not linking {} and {}: cross pair {}/{} is below the link floor",
                        self.key_of(a),
                        self.key_of(b),
                        self.key_of(x),
                        self.key_of(y)
                    );
                    return;
                }
            }
        }
        self.sets.union(left_root, right_root);
    }

    fn key_of(&self, index: usize) -> String {
        self.records
            .get(index)
            .map_or_else(String::new, |record| record.key.to_string())
    }

    /// Lowest and highest pairwise score inside a set of two or more.
    fn score_range(&mut self, set: &[usize]) -> Option<ScoreRange> {
        let mut range: Option<ScoreRange> = None;
        for (position, &a) in set.iter().enumerate() {
            for &b in set.iter().skip(position + 1) {
                let score = self.score(a, b);
                range = Some(range.map_or(
                    ScoreRange {
                        min: score,
                        max: score,
                    },
                    |seen| ScoreRange {
                        min: seen.min.min(score),
                        max: seen.max.max(score),
                    },
                ));
            }
        }
        range
    }
}
