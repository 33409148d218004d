//! Deterministic [`Geocoder`] double for resolver and pipeline tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use corral_core::{GeocodeCandidate, GeocodeError, Geocoder};

type Reply = Result<Vec<GeocodeCandidate>, GeocodeError>;

/// Stub geocoder returning scripted replies per address.
///
/// Replies for an address are handed out in order; the last one repeats once
/// the script runs out. Addresses without a script get the fallback, which
/// defaults to "no candidates".
#[derive(Debug)]
pub struct StubGeocoder {
    replies: HashMap<String, Vec<Reply>>,
    fallback: Reply,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
}

impl Default for StubGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StubGeocoder {
    /// Stub answering every address with no candidates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            fallback: Ok(Vec::new()),
            delay: None,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Append a reply to the script for `address`.
    #[must_use]
    pub fn with_reply(mut self, address: impl Into<String>, reply: Reply) -> Self {
        self.replies.entry(address.into()).or_default().push(reply);
        self
    }

    /// Reply used for addresses without a script.
    #[must_use]
    pub fn with_fallback(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    /// Sleep before every reply.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total calls so far.
    pub fn calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    /// Calls so far for one address.
    pub fn calls_for(&self, address: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    fn next_reply(&self, address: &str) -> Reply {
        let attempt = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            let count = calls.entry(address.to_owned()).or_default();
            *count += 1;
            *count - 1
        };
        self.replies
            .get(address)
            .and_then(|script| script.get(attempt).or_else(|| script.last()))
            .unwrap_or(&self.fallback)
            .clone()
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let reply = self.next_reply(address);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
