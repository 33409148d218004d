//! Geocoder trait and candidate type.

use async_trait::async_trait;
use geo::Coord;
use serde::{Deserialize, Serialize};

use super::error::GeocodeError;

/// One place the geocoder believes an address refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    /// WGS84 position, `x` longitude and `y` latitude.
    pub location: Coord,
    /// Geocoder confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Human-readable label returned by the geocoder.
    pub label: String,
}

/// Turn a single-line address into candidate coordinates.
///
/// Implementations return every plausible candidate, best first. An empty
/// vector means the address matched nothing. Errors should be classified so
/// that [`GeocodeError::is_transient`] tells the caller whether a retry is
/// worthwhile.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use geo::Coord;
/// use corral_core::{GeocodeCandidate, GeocodeError, Geocoder};
///
/// struct NullIsland;
///
/// #[async_trait]
/// impl Geocoder for NullIsland {
///     async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
///         if address.trim().is_empty() {
///             return Err(GeocodeError::EmptyAddress);
///         }
///         Ok(vec![GeocodeCandidate {
///             location: Coord { x: 0.0, y: 0.0 },
///             confidence: 1.0,
///             label: address.to_owned(),
///         }])
///     }
/// }
/// ```
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `address`.
    ///
    /// Implementations must return `Err(GeocodeError::EmptyAddress)` when
    /// `address` is blank.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}
