//! Clustering, merging and ordering of canonical listings.
//!
//! [`MergeEngine`] turns a batch of resolved records into merged entities:
//! 1. Records are bucketed by a spatial grid and by locality so only
//!    plausible pairs are scored.
//! 2. Pairs at or above the merge threshold are linked best first through a
//!    union-find. A link is refused when any pair across the two sets scores
//!    below the link floor, which stops weak transitive chains.
//! 3. Each cluster's fields are settled by source ranking, field confidence
//!    and the configured tie-break rule. Every chosen value keeps the key of
//!    the record it came from. Coordinates go to the most confident member,
//!    and distant comparable rivals flag the entity.
//!
//! [`aggregate`] then orders entities for export.

#![forbid(unsafe_code)]

mod aggregate;
mod bucket;
mod engine;
mod merge;
mod union_find;

pub use aggregate::aggregate;
pub use engine::MergeEngine;
