//! Pairwise similarity scoring for canonical listings.
//!
//! [`SimilarityMatcher`] implements [`PairScorer`](corral_core::PairScorer)
//! by blending three signals:
//! - **Name**: token-set similarity over the normalised match keys, so word
//!   order and trailing branch words do not matter.
//! - **Address**: street agreement (house numbers must match) blended with
//!   locality agreement (ZIP, city and state).
//! - **Distance**: great-circle distance decayed linearly from full credit to
//!   zero.
//!
//! Scoring is pure and symmetric; the merge engine may call it from any
//! thread.

#![forbid(unsafe_code)]

mod address;
mod matcher;
mod spatial;
mod text;

pub use address::address_similarity;
pub use matcher::SimilarityMatcher;
pub use spatial::{distance_m, spatial_credit};
pub use text::token_set_similarity;
