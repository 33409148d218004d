//! Geocoding collaborator contract.
//!
//! The engine only needs an address turned into candidate coordinates. The
//! HTTP adapter and the resolver that drives it live in `corral-data`.

mod error;
mod provider;

pub use error::GeocodeError;
pub use provider::{GeocodeCandidate, Geocoder};
