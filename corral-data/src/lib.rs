//! Data-side stages of the Corral reconciliation engine.
//!
//! Responsibilities:
//! - Turn provider-specific raw records into canonical records.
//! - Resolve missing coordinates through a geocoding collaborator.
//! - Read raw batches and write merged entities as JSON.
//!
//! Boundaries:
//! - Matching and merging live in `corral-matcher` and `corral-dedup`.
//! - Fetching listings from the providers is out of scope; adapters hand
//!   over already-materialised [`corral_core::RawRecord`] batches.
//!
//! Invariants:
//! - Normalisation is pure and idempotent.
//! - Resolved coordinates never replace more confident ones.

pub mod geocode;
mod json;
mod normalize;

pub use geocode::{GeocodeResolver, NominatimConfig, NominatimGeocoder, ResolveError, ResolvedBatch};
pub use json::{JsonEntitySink, JsonRecordSource};
pub use normalize::{NormalizedBatch, Normalizer};
