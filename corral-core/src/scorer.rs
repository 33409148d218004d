//! Pairwise record similarity.
//!
//! The `PairScorer` trait assigns a match score to two
//! [`CanonicalRecord`](crate::CanonicalRecord)s. The merge engine is generic
//! over it so alternative matchers can be swapped in.

use serde::{Deserialize, Serialize};

use crate::CanonicalRecord;

/// Score and breakdown for one record pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Weighted total in `[0.0, 1.0]`.
    pub total: f64,
    /// Name similarity in `[0.0, 1.0]`.
    pub name: f64,
    /// Address similarity in `[0.0, 1.0]`.
    pub address: f64,
    /// Spatial credit; `None` when either record lacks coordinates.
    pub spatial: Option<f64>,
    /// Great-circle distance in metres; `None` when either record lacks
    /// coordinates.
    pub distance_m: Option<f64>,
}

impl MatchScore {
    /// A certain match, used for two fetches of the same listing.
    #[must_use]
    pub const fn certain() -> Self {
        Self {
            total: 1.0,
            name: 1.0,
            address: 1.0,
            spatial: None,
            distance_m: None,
        }
    }
}

/// Score how likely two records describe the same store.
///
/// Implementations must be pure and thread-safe, and must:
/// - be symmetric: `score(a, b) == score(b, a)`;
/// - return a finite total in `0.0..=1.0`.
///
/// Use [`PairScorer::sanitise`] to apply the range guard.
///
/// # Examples
///
/// ```rust
/// use corral_core::{CanonicalRecord, MatchScore, PairScorer};
///
/// struct SameName;
///
/// impl PairScorer for SameName {
///     fn score(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> MatchScore {
///         let hit = if a.name_key == b.name_key { 1.0 } else { 0.0 };
///         MatchScore { total: hit, name: hit, address: 0.0, spatial: None, distance_m: None }
///     }
/// }
///
/// assert_eq!(<SameName as PairScorer>::sanitise(f64::NAN), 0.0);
/// ```
pub trait PairScorer: Send + Sync {
    /// Score the pair `a`, `b`.
    fn score(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> MatchScore;

    /// Farthest distance in metres at which proximity still lifts a score.
    ///
    /// The merge engine widens its spatial search to this distance. `None`
    /// means location plays no part and one grid cell of neighbours suffices.
    fn spatial_reach_m(&self) -> Option<f64> {
        None
    }

    /// Clamp a raw score to `0.0..=1.0`, mapping non-finite values to `0.0`.
    fn sanitise(score: f64) -> f64
    where
        Self: Sized,
    {
        if !score.is_finite() {
            return 0.0;
        }
        score.clamp(0.0, 1.0)
    }
}
