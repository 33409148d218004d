//! Geocode resolution and the HTTP geocoder.
//!
//! [`GeocodeResolver`] drives any [`corral_core::Geocoder`]: it skips records
//! whose coordinates are already trusted, looks each distinct address up
//! once through a bounded pool, retries transient failures with backoff and
//! flags ambiguous answers. [`NominatimGeocoder`] is the production
//! collaborator.

mod nominatim;
mod resolver;

#[doc(hidden)]
pub mod test_support;

pub use nominatim::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, NominatimBuildError, NominatimConfig, NominatimGeocoder,
};
pub use resolver::{GeocodeResolver, Lookup, ResolveError, ResolvedBatch};
