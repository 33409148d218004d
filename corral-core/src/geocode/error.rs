use thiserror::Error;

/// Errors from [`crate::Geocoder::geocode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The query was blank.
    #[error("cannot geocode an empty address")]
    EmptyAddress,

    /// The request did not complete within the configured timeout.
    #[error("geocoder request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL, or the query when no URL applies.
        url: String,
        /// Timeout that elapsed, in seconds.
        timeout_secs: u64,
    },

    /// The geocoder answered with a non-success status.
    #[error("geocoder request to {url} failed with HTTP {status}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Underlying error message.
        message: String,
    },

    /// The response could not be decoded.
    #[error("failed to parse geocoder response: {message}")]
    Parse {
        /// Decoder error message.
        message: String,
    },
}

impl GeocodeError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, network failures and server-side (5xx) errors are transient.
    /// Client errors, bad payloads and empty queries are not.
    ///
    /// # Examples
    ///
    /// ```
    /// use corral_core::GeocodeError;
    ///
    /// let busy = GeocodeError::Http { url: "u".into(), status: 503, message: String::new() };
    /// let bad = GeocodeError::Http { url: "u".into(), status: 400, message: String::new() };
    /// assert!(busy.is_transient());
    /// assert!(!bad.is_transient());
    /// ```
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::EmptyAddress | Self::Parse { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GeocodeError::Timeout { url: "u".into(), timeout_secs: 10 }, true)]
    #[case(GeocodeError::Network { url: "u".into(), message: "reset".into() }, true)]
    #[case(GeocodeError::Http { url: "u".into(), status: 502, message: String::new() }, true)]
    #[case(GeocodeError::Http { url: "u".into(), status: 429, message: String::new() }, false)]
    #[case(GeocodeError::Parse { message: "eof".into() }, false)]
    #[case(GeocodeError::EmptyAddress, false)]
    fn classifies_transient_failures(#[case] error: GeocodeError, #[case] transient: bool) {
        assert_eq!(error.is_transient(), transient);
    }

    #[rstest]
    fn timeout_message_names_url() {
        let error = GeocodeError::Timeout {
            url: "http://geo/search".into(),
            timeout_secs: 5,
        };
        assert_eq!(
            error.to_string(),
            "geocoder request to http://geo/search timed out after 5s"
        );
    }
}
