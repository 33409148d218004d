//! Core domain types for the Corral reconciliation engine.
//!
//! Raw listings arrive from several providers in their own shapes. The
//! normaliser turns each into a [`CanonicalRecord`]; the merge engine groups
//! records describing the same store into a [`MergedEntity`]. This crate holds
//! those types, the run configuration and the collaborator traits at the
//! engine's edges. Behaviour lives in the sibling crates.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod collab;
mod config;
mod entity;
pub mod geocode;
mod raw;
mod record;
mod rejection;
mod scorer;
mod source;
mod summary;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use collab::{EntitySink, EntitySinkError, RecordSource, RecordSourceError};
pub use config::{
    ConfigError, GeocodeConfig, MatchConfig, MergeConfig, NormalizeConfig, ReconcileConfig,
    TieBreak, UnknownTieBreak,
};
pub use entity::{
    Attributed, ClusterId, MergeField, MergedEntity, MergedFields, ReviewReason, ScoreRange,
};
pub use geocode::{GeocodeCandidate, GeocodeError, Geocoder};
pub use raw::{
    GoogleLatLng, GooglePlace, LatLon, LocalizedText, OsmElement, RawRecord, ScrapedListing,
    SourcePayload, YelpBusiness, YelpCategory, YelpCoordinates, YelpLocation,
};
pub use record::{
    CanonicalRecord, Category, FieldConfidence, GeocodeStatus, RecordKey, ReviewSummary,
    UnresolvedReason,
};
pub use rejection::{RejectReason, Rejection};
pub use scorer::{MatchScore, PairScorer};
pub use source::{SourceId, UnknownSource};
pub use summary::RunSummary;

/// Default values for every configuration knob.
pub mod defaults {
    pub use crate::config::{
        DEFAULT_ADDRESS_WEIGHT, DEFAULT_AMBIGUITY_RADIUS_M, DEFAULT_BUCKET_SIZE_M,
        DEFAULT_CONFIDENCE_TOLERANCE, DEFAULT_FALLBACK_ADDRESS_WEIGHT,
        DEFAULT_FALLBACK_NAME_WEIGHT, DEFAULT_FULL_CREDIT_M, DEFAULT_GEOCODE_ATTEMPTS,
        DEFAULT_GEOCODE_BACKOFF_MS, DEFAULT_GEOCODE_CONCURRENCY, DEFAULT_GEOCODE_TIMEOUT_SECS,
        DEFAULT_LINK_FLOOR, DEFAULT_MERGE_THRESHOLD, DEFAULT_NAME_WEIGHT, DEFAULT_REVIEW_SPREAD,
        DEFAULT_SPATIAL_WEIGHT, DEFAULT_TRUST_THRESHOLD, DEFAULT_ZERO_CREDIT_M,
    };
}
