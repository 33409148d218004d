//! Facade crate for the Corral reconciliation engine.
//!
//! Re-exports the domain types and the stage implementations, and wires them
//! into a [`Pipeline`] that turns raw provider listings into ordered, merged
//! store entities.

#![forbid(unsafe_code)]

mod pipeline;

pub use corral_core::{
    CanonicalRecord, ConfigError, EntitySink, EntitySinkError, GeocodeCandidate, GeocodeError,
    Geocoder, MergedEntity, PairScorer, RawRecord, ReconcileConfig, RecordSource,
    RecordSourceError, RejectReason, Rejection, ReviewReason, RunSummary, SourceId, TieBreak,
};
pub use corral_data::{
    GeocodeResolver, JsonEntitySink, JsonRecordSource, NominatimConfig, NominatimGeocoder,
    Normalizer, ResolveError,
};
pub use corral_dedup::{MergeEngine, aggregate};
pub use corral_matcher::SimilarityMatcher;
pub use pipeline::{Pipeline, PipelineError, RunReport};
