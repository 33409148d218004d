//! Nominatim HTTP geocoder.
//!
//! Calls the `/search` endpoint with `format=jsonv2` and maps each place to a
//! [`GeocodeCandidate`]. Nominatim's `importance` stands in for confidence.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use corral_core::{GeocodeCandidate, GeocodeError, Geocoder};
use geo::Coord;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Default user agent; Nominatim's usage policy requires one.
pub const DEFAULT_USER_AGENT: &str = "corral-geocoder/0.1";

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LIMIT: u8 = 5;
/// Confidence for places that report no importance.
const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Error raised while building a [`NominatimGeocoder`].
#[derive(Debug, Error)]
pub enum NominatimBuildError {
    /// The base URL did not parse.
    #[error("invalid Nominatim base URL `{url}`")]
    InvalidUrl {
        /// URL as supplied.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`NominatimGeocoder`].
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Service root, e.g. `https://nominatim.openstreetmap.org/`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Maximum candidates requested per address.
    pub limit: u8,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl NominatimConfig {
    /// Configuration pointing at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// One place in a `jsonv2` search response.
#[derive(Debug, Deserialize)]
struct SearchPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    display_name: String,
}

impl SearchPlace {
    fn into_candidate(self) -> Result<GeocodeCandidate, GeocodeError> {
        let parse = |value: &str, axis: &str| {
            value.parse::<f64>().map_err(|err| GeocodeError::Parse {
                message: format!("bad {axis} `{value}`: {err}"),
            })
        };
        let y = parse(&self.lat, "latitude")?;
        let x = parse(&self.lon, "longitude")?;
        Ok(GeocodeCandidate {
            location: Coord { x, y },
            confidence: self
                .importance
                .unwrap_or(DEFAULT_IMPORTANCE)
                .clamp(0.0, 1.0),
            label: self.display_name,
        })
    }
}

/// [`Geocoder`] backed by a Nominatim server.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use corral_core::Geocoder;
/// use corral_data::geocode::{NominatimConfig, NominatimGeocoder};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let geocoder = NominatimGeocoder::with_config(
///     NominatimConfig::new("http://localhost:8080/")
///         .with_timeout(Duration::from_secs(5))
///         .with_user_agent("corral-tests/1.0"),
/// )?;
/// let candidates = geocoder.geocode("100 main street, fort worth, tx 76102").await?;
/// println!("{} candidates", candidates.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: Url,
    config: NominatimConfig,
}

impl NominatimGeocoder {
    /// Geocoder against `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, NominatimBuildError> {
        Self::with_config(NominatimConfig::new(base_url))
    }

    /// Geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: NominatimConfig) -> Result<Self, NominatimBuildError> {
        let invalid = |source| NominatimBuildError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        };
        let mut base = Url::parse(&config.base_url).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url = base.join("search").map_err(invalid)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(NominatimBuildError::HttpClient)?;
        Ok(Self {
            client,
            search_url,
            config,
        })
    }

    fn request_url(&self, address: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "jsonv2")
            .append_pair("limit", &self.config.limit.to_string())
            .append_pair("countrycodes", "us");
        url
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> GeocodeError {
        if error.is_timeout() {
            return GeocodeError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return GeocodeError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        GeocodeError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        let url = self.request_url(address);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        let places: Vec<SearchPlace> =
            response.json().await.map_err(|err| GeocodeError::Parse {
                message: err.to_string(),
            })?;
        places.into_iter().map(SearchPlace::into_candidate).collect()
    }
}
