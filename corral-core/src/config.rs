//! Tunable knobs for a reconciliation run.
//!
//! Every threshold the engine uses is named here with its default. The CLI
//! layers command-line and environment overrides on top; [`ReconcileConfig::validate`]
//! runs once at start-up and is the only hard stop in the pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Category, SourceId};

/// Default name weight when both records are located.
pub const DEFAULT_NAME_WEIGHT: f64 = 0.4;
/// Default address weight when both records are located.
pub const DEFAULT_ADDRESS_WEIGHT: f64 = 0.3;
/// Default spatial weight when both records are located.
pub const DEFAULT_SPATIAL_WEIGHT: f64 = 0.3;
/// Default name weight when a coordinate is missing.
pub const DEFAULT_FALLBACK_NAME_WEIGHT: f64 = 0.6;
/// Default address weight when a coordinate is missing.
pub const DEFAULT_FALLBACK_ADDRESS_WEIGHT: f64 = 0.4;
/// Distance in metres that still earns full spatial credit.
pub const DEFAULT_FULL_CREDIT_M: f64 = 50.0;
/// Distance in metres beyond which spatial credit is zero.
pub const DEFAULT_ZERO_CREDIT_M: f64 = 500.0;
/// Default merge threshold.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.75;
/// Default lowest score any pair inside a cluster may have.
pub const DEFAULT_LINK_FLOOR: f64 = 0.5;
/// Default internal score spread that triggers review.
pub const DEFAULT_REVIEW_SPREAD: f64 = 0.3;
/// Default tolerance under which confidences count as comparable.
pub const DEFAULT_CONFIDENCE_TOLERANCE: f64 = 0.1;
/// Default spatial bucket edge in metres.
pub const DEFAULT_BUCKET_SIZE_M: f64 = 200.0;
/// Default confidence at which provided coordinates skip geocoding.
pub const DEFAULT_TRUST_THRESHOLD: f64 = 0.8;
/// Default spread in metres above which geocoder candidates are ambiguous.
pub const DEFAULT_AMBIGUITY_RADIUS_M: f64 = 1_000.0;
/// Default confidence gap below the best candidate that still counts as a
/// rival when judging ambiguity.
pub const DEFAULT_AMBIGUITY_MARGIN: f64 = 0.2;
/// Default number of concurrent geocoder calls.
pub const DEFAULT_GEOCODE_CONCURRENCY: usize = 4;
/// Default per-call geocoder timeout in seconds.
pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;
/// Default number of geocoder attempts for transient failures.
pub const DEFAULT_GEOCODE_ATTEMPTS: u32 = 3;
/// Default initial retry backoff in milliseconds.
pub const DEFAULT_GEOCODE_BACKOFF_MS: u64 = 500;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Complete configuration for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileConfig {
    /// Normaliser settings.
    pub normalize: NormalizeConfig,
    /// Geocode resolver settings.
    pub geocode: GeocodeConfig,
    /// Similarity matcher settings.
    pub matching: MatchConfig,
    /// Merge engine settings.
    pub merge: MergeConfig,
}

impl ReconcileConfig {
    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    ///
    /// # Examples
    ///
    /// ```
    /// use corral_core::{ConfigError, ReconcileConfig};
    ///
    /// let mut config = ReconcileConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.merge.threshold = 1.5;
    /// assert!(matches!(
    ///     config.validate(),
    ///     Err(ConfigError::OutOfRange { field: "merge.threshold", .. })
    /// ));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.normalize.validate()?;
        self.geocode.validate()?;
        self.matching.validate()?;
        self.merge.validate()
    }
}

/// Category keyword lists used by the normaliser.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Lower-case terms per category. Multi-word terms match as phrases.
    pub keywords: BTreeMap<Category, Vec<String>>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        let lists: [(Category, &[&str]); 3] = [
            (
                Category::WesternWear,
                &[
                    "western", "western wear", "cowboy", "cowgirl", "ranch", "rodeo", "saddlery",
                    "tack", "wrangler",
                ],
            ),
            (
                Category::BootShop,
                &["boot", "boots", "bootmaker", "boot barn", "shoe", "shoes"],
            ),
            (
                Category::HatShop,
                &["hat", "hats", "hatter", "hatters", "millinery"],
            ),
        ];
        Self {
            keywords: lists
                .into_iter()
                .map(|(category, terms)| {
                    (category, terms.iter().map(|term| (*term).to_owned()).collect())
                })
                .collect(),
        }
    }
}

impl NormalizeConfig {
    /// Replace the term list for one category.
    #[must_use]
    pub fn with_keywords(mut self, category: Category, terms: Vec<String>) -> Self {
        self.keywords.insert(category, terms);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.contains_key(&Category::Mixed) {
            return Err(ConfigError::MixedKeywords);
        }
        for (category, terms) in &self.keywords {
            if terms.is_empty() || terms.iter().any(|term| term.trim().is_empty()) {
                return Err(ConfigError::EmptyKeyword {
                    category: *category,
                });
            }
        }
        Ok(())
    }
}

/// Geocode resolver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeConfig {
    /// Provided coordinates at or above this confidence skip the geocoder.
    pub trust_threshold: f64,
    /// Rival candidates farther apart than this make an address ambiguous.
    pub ambiguity_radius_m: f64,
    /// Candidates within this much confidence of the best one are rivals;
    /// weaker ones never make an address ambiguous.
    pub ambiguity_margin: f64,
    /// Maximum concurrent geocoder calls.
    pub concurrency: usize,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Attempts per address for transient failures.
    pub max_attempts: u32,
    /// Initial backoff, doubled after each failed attempt.
    pub backoff: Duration,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            trust_threshold: DEFAULT_TRUST_THRESHOLD,
            ambiguity_radius_m: DEFAULT_AMBIGUITY_RADIUS_M,
            ambiguity_margin: DEFAULT_AMBIGUITY_MARGIN,
            concurrency: DEFAULT_GEOCODE_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_GEOCODE_TIMEOUT_SECS),
            max_attempts: DEFAULT_GEOCODE_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_GEOCODE_BACKOFF_MS),
        }
    }
}

impl GeocodeConfig {
    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the initial retry backoff.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the concurrency limit.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("geocode.trust_threshold", self.trust_threshold)?;
        positive("geocode.ambiguity_radius_m", self.ambiguity_radius_m)?;
        unit_interval("geocode.ambiguity_margin", self.ambiguity_margin)?;
        if self.concurrency == 0 {
            return Err(ConfigError::Zero {
                field: "geocode.concurrency",
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero {
                field: "geocode.max_attempts",
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero {
                field: "geocode.timeout",
            });
        }
        Ok(())
    }
}

/// Similarity matcher weights and spatial decay.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Name weight when both records are located.
    pub name_weight: f64,
    /// Address weight when both records are located.
    pub address_weight: f64,
    /// Spatial weight when both records are located.
    pub spatial_weight: f64,
    /// Name weight when either record lacks coordinates.
    pub fallback_name_weight: f64,
    /// Address weight when either record lacks coordinates.
    pub fallback_address_weight: f64,
    /// Distance that still earns full spatial credit.
    pub full_credit_m: f64,
    /// Distance beyond which spatial credit is zero.
    pub zero_credit_m: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            name_weight: DEFAULT_NAME_WEIGHT,
            address_weight: DEFAULT_ADDRESS_WEIGHT,
            spatial_weight: DEFAULT_SPATIAL_WEIGHT,
            fallback_name_weight: DEFAULT_FALLBACK_NAME_WEIGHT,
            fallback_address_weight: DEFAULT_FALLBACK_ADDRESS_WEIGHT,
            full_credit_m: DEFAULT_FULL_CREDIT_M,
            zero_credit_m: DEFAULT_ZERO_CREDIT_M,
        }
    }
}

impl MatchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("matching.name_weight", self.name_weight)?;
        unit_interval("matching.address_weight", self.address_weight)?;
        unit_interval("matching.spatial_weight", self.spatial_weight)?;
        unit_interval("matching.fallback_name_weight", self.fallback_name_weight)?;
        unit_interval(
            "matching.fallback_address_weight",
            self.fallback_address_weight,
        )?;
        weights_sum_to_one(
            "matching",
            self.name_weight + self.address_weight + self.spatial_weight,
        )?;
        weights_sum_to_one(
            "matching.fallback",
            self.fallback_name_weight + self.fallback_address_weight,
        )?;
        if !(self.full_credit_m >= 0.0 && self.full_credit_m < self.zero_credit_m) {
            return Err(ConfigError::DecayOrder {
                full_credit_m: self.full_credit_m,
                zero_credit_m: self.zero_credit_m,
            });
        }
        if !self.zero_credit_m.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "matching.zero_credit_m",
                value: self.zero_credit_m,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(())
    }
}

/// How equal-rank, equal-confidence conflicts are settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the value from the record with the smallest key.
    FirstListed,
    /// Keep the value from the most recently retrieved record.
    MostRecent,
    /// Keep the first-listed value and flag the entity for review.
    #[default]
    FlagForReview,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FirstListed => "first_listed",
            Self::MostRecent => "most_recent",
            Self::FlagForReview => "flag_for_review",
        })
    }
}

/// Error returned when parsing an unknown tie-break rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tie-break rule `{0}`; expected first_listed, most_recent or flag_for_review")]
pub struct UnknownTieBreak(pub String);

impl FromStr for TieBreak {
    type Err = UnknownTieBreak;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_listed" => Ok(Self::FirstListed),
            "most_recent" => Ok(Self::MostRecent),
            "flag_for_review" => Ok(Self::FlagForReview),
            _ => Err(UnknownTieBreak(s.to_owned())),
        }
    }
}

/// Merge engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Pairs scoring at or above this are merge candidates.
    pub threshold: f64,
    /// Every pair inside a cluster must score at least this.
    pub link_floor: f64,
    /// Internal score spread above this flags the cluster.
    pub review_spread: f64,
    /// Confidences within this of each other are comparable.
    pub confidence_tolerance: f64,
    /// Edge of a spatial bucket in metres.
    pub bucket_size_m: f64,
    /// Comparably confident member coordinates farther apart than this flag
    /// the entity.
    pub ambiguity_radius_m: f64,
    /// Source precedence, highest first. Unlisted sources rank last.
    pub ranking: Vec<SourceId>,
    /// Rule for equal-rank, equal-confidence conflicts.
    pub tie_break: TieBreak,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MERGE_THRESHOLD,
            link_floor: DEFAULT_LINK_FLOOR,
            review_spread: DEFAULT_REVIEW_SPREAD,
            confidence_tolerance: DEFAULT_CONFIDENCE_TOLERANCE,
            bucket_size_m: DEFAULT_BUCKET_SIZE_M,
            ambiguity_radius_m: DEFAULT_AMBIGUITY_RADIUS_M,
            ranking: SourceId::ALL.to_vec(),
            tie_break: TieBreak::default(),
        }
    }
}

impl MergeConfig {
    /// Position of `source` in the ranking; lower is preferred.
    ///
    /// # Examples
    ///
    /// ```
    /// use corral_core::{MergeConfig, SourceId};
    ///
    /// let config = MergeConfig::default();
    /// assert!(config.rank(SourceId::Osm) < config.rank(SourceId::Yelp));
    /// ```
    #[must_use]
    pub fn rank(&self, source: SourceId) -> usize {
        self.ranking
            .iter()
            .position(|ranked| *ranked == source)
            .unwrap_or(self.ranking.len())
    }

    /// Set the merge threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the tie-break rule.
    #[must_use]
    pub const fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set the source ranking.
    #[must_use]
    pub fn with_ranking(mut self, ranking: Vec<SourceId>) -> Self {
        self.ranking = ranking;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "merge.threshold",
                value: self.threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        unit_interval("merge.link_floor", self.link_floor)?;
        if self.link_floor > self.threshold {
            return Err(ConfigError::LinkFloorAboveThreshold {
                link_floor: self.link_floor,
                threshold: self.threshold,
            });
        }
        unit_interval("merge.review_spread", self.review_spread)?;
        unit_interval("merge.confidence_tolerance", self.confidence_tolerance)?;
        positive("merge.bucket_size_m", self.bucket_size_m)?;
        positive("merge.ambiguity_radius_m", self.ambiguity_radius_m)?;
        let mut seen = BTreeSet::new();
        for source in &self.ranking {
            if !seen.insert(*source) {
                return Err(ConfigError::DuplicateRanking { duplicate: *source });
            }
        }
        Ok(())
    }
}

/// Invalid configuration. Fatal at start-up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A value lies outside its allowed range.
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        /// Dotted field path.
        field: &'static str,
        /// Offending value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// A weight set does not sum to one.
    #[error("{set} weights must sum to 1.0, got {sum}")]
    WeightsDoNotSum {
        /// Weight set name.
        set: &'static str,
        /// Actual sum.
        sum: f64,
    },
    /// The spatial decay distances are out of order.
    #[error("full-credit distance {full_credit_m} m must be below zero-credit distance {zero_credit_m} m")]
    DecayOrder {
        /// Full-credit distance.
        full_credit_m: f64,
        /// Zero-credit distance.
        zero_credit_m: f64,
    },
    /// The link floor exceeds the merge threshold.
    #[error("link floor {link_floor} exceeds merge threshold {threshold}")]
    LinkFloorAboveThreshold {
        /// Configured link floor.
        link_floor: f64,
        /// Configured merge threshold.
        threshold: f64,
    },
    /// A source appears twice in the ranking.
    #[error("source `{duplicate}` appears more than once in the ranking")]
    DuplicateRanking {
        /// Repeated source.
        duplicate: SourceId,
    },
    /// A count or duration is zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Dotted field path.
        field: &'static str,
    },
    /// A category has an empty keyword list or a blank term.
    #[error("keyword list for `{category}` must contain non-blank terms")]
    EmptyKeyword {
        /// Category concerned.
        category: Category,
    },
    /// Keywords were configured for the fallback category.
    #[error("`mixed` is assigned by classification and cannot have keywords")]
    MixedKeywords,
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        })
    }
}

fn weights_sum_to_one(set: &'static str, sum: f64) -> Result<(), ConfigError> {
    if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
        Ok(())
    } else {
        Err(ConfigError::WeightsDoNotSum { set, sum })
    }
}
