//! Batch geocode resolution with caching, bounded concurrency and retries.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use corral_core::{
    CanonicalRecord, GeocodeCandidate, GeocodeConfig, GeocodeError, Geocoder, UnresolvedReason,
};
use futures_util::stream::{self, StreamExt};
use geo::{Distance, Haversine, Point};
use log::{debug, info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Error returned when a resolution batch is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The run was cancelled; no records are returned.
    #[error("geocode resolution cancelled")]
    Cancelled,
}

/// Cached outcome of looking up one address.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A single usable position.
    Found(GeocodeCandidate),
    /// Comparably confident candidates lay further apart than the
    /// ambiguity radius.
    Ambiguous {
        /// Number of rival candidates.
        candidates: usize,
    },
    /// Nothing usable: no match, a permanent failure, or retries exhausted.
    Unavailable,
}

/// Records after resolution plus lookup statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedBatch {
    /// Records in input order.
    pub records: Vec<CanonicalRecord>,
    /// Geocoder lookups issued for this batch.
    pub lookups: usize,
    /// Addresses answered from the cache of earlier batches.
    pub cache_hits: usize,
}

/// Fills in coordinates for records that lack trustworthy ones.
///
/// Each distinct address is looked up at most once per resolver; the cache
/// lives as long as the resolver does, which is one run.
#[derive(Debug)]
pub struct GeocodeResolver<G> {
    geocoder: G,
    config: GeocodeConfig,
    cache: Mutex<HashMap<String, Lookup>>,
}

impl<G: Geocoder> GeocodeResolver<G> {
    /// Wrap `geocoder` with the retry and trust settings in `config`.
    pub fn new(geocoder: G, config: GeocodeConfig) -> Self {
        Self {
            geocoder,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Settings in use.
    pub const fn config(&self) -> &GeocodeConfig {
        &self.config
    }

    /// The wrapped geocoder.
    pub const fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Cached outcome for a normalised address, if it has been looked up.
    pub fn cached(&self, address: &str) -> Option<Lookup> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .cloned()
    }

    /// Resolve coordinates for a batch.
    ///
    /// Records whose location confidence already meets the trust threshold
    /// are passed through untouched. The rest are looked up by
    /// [`CanonicalRecord::address_query`]; failures leave them without
    /// coordinates and with an explicit reason.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] if `cancel` fires before every
    /// lookup finished. No records are returned in that case.
    pub async fn resolve_batch(
        &self,
        mut records: Vec<CanonicalRecord>,
        cancel: &CancellationToken,
    ) -> Result<ResolvedBatch, ResolveError> {
        let pending: BTreeSet<String> = records
            .iter()
            .filter(|record| self.needs_lookup(record))
            .filter_map(CanonicalRecord::address_query)
            .collect();
        let (cached, fresh): (Vec<String>, Vec<String>) = {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            pending
                .into_iter()
                .partition(|address| cache.contains_key(address))
        };

        let outcomes: Vec<(String, Option<Lookup>)> = stream::iter(fresh)
            .map(|address| async move {
                let lookup = self.lookup(&address, cancel).await;
                (address, lookup)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        if cancel.is_cancelled() {
            warn!("geocode resolution cancelled");
            return Err(ResolveError::Cancelled);
        }

        let lookups = outcomes.len();
        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            for (address, lookup) in outcomes {
                let Some(lookup) = lookup else {
                    return Err(ResolveError::Cancelled);
                };
                cache.insert(address, lookup);
            }
            for record in &mut records {
                if !self.needs_lookup(record) {
                    continue;
                }
                let lookup = record
                    .address_query()
                    .and_then(|address| cache.get(&address).cloned())
                    .unwrap_or(Lookup::Unavailable);
                apply(record, lookup);
            }
        }
        info!(
            "geocoded {lookups} addresses ({} from cache)",
            cached.len()
        );
        Ok(ResolvedBatch {
            records,
            lookups,
            cache_hits: cached.len(),
        })
    }

    fn needs_lookup(&self, record: &CanonicalRecord) -> bool {
        record.location.is_none() || record.confidence.location < self.config.trust_threshold
    }

    /// Look up one address with retries. `None` means cancelled.
    async fn lookup(&self, address: &str, cancel: &CancellationToken) -> Option<Lookup> {
        let mut backoff = self.config.backoff;
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            let call = tokio::time::timeout(self.config.timeout, self.geocoder.geocode(address));
            let result = tokio::select! {
                () = cancel.cancelled() => return None,
                outcome = call => outcome.unwrap_or_else(|_| Err(GeocodeError::Timeout {
                    url: address.to_owned(),
                    timeout_secs: self.config.timeout.as_secs(),
                })),
            };
            match result {
                Ok(candidates) => return Some(self.judge(address, &candidates)),
                Err(err) if err.is_transient() && attempt < attempts => {
                    debug!("attempt {attempt} for `{address}` failed: {err}; retrying");
                    tokio::select! {
                        () = cancel.cancelled() => return None,
                        () = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(err) => {
                    warn!("geocoding `{address}` failed after {attempt} attempt(s): {err}");
                    return Some(Lookup::Unavailable);
                }
            }
        }
        Some(Lookup::Unavailable)
    }

    /// Decide what a candidate list means for one address.
    ///
    /// Only candidates within the ambiguity margin of the best confidence are
    /// compared; a weak far-off hit does not spoil a confident one.
    fn judge(&self, address: &str, candidates: &[GeocodeCandidate]) -> Lookup {
        let Some(best) = candidates
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        else {
            return Lookup::Unavailable;
        };
        let floor = rival_floor(best.confidence, self.config.ambiguity_margin);
        let rivals: Vec<&GeocodeCandidate> = candidates
            .iter()
            .filter(|candidate| candidate.confidence >= floor)
            .collect();
        let spread_out = rivals.iter().enumerate().any(|(index, a)| {
            rivals.iter().skip(index + 1).any(|b| {
                Haversine.distance(Point::from(a.location), Point::from(b.location))
                    > self.config.ambiguity_radius_m
            })
        });
        if spread_out {
            debug!(
                "`{address}` is ambiguous across {} of {} candidates",
                rivals.len(),
                candidates.len()
            );
            return Lookup::Ambiguous {
                candidates: rivals.len(),
            };
        }
        Lookup::Found(best.clone())
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "rivals lie within a margin of the best confidence"
)]
const fn rival_floor(best: f64, margin: f64) -> f64 {
    best - margin
}

fn apply(record: &mut CanonicalRecord, lookup: Lookup) {
    match lookup {
        Lookup::Found(candidate) => {
            if !record.apply_geocode(candidate.location, candidate.confidence) {
                debug!(
                    "kept provided coordinates for {} over geocoder result",
                    record.key
                );
            }
        }
        Lookup::Ambiguous { candidates } => {
            record.mark_unresolved(UnresolvedReason::AmbiguousLocation { candidates });
        }
        Lookup::Unavailable => record.mark_unresolved(UnresolvedReason::GeocodeUnavailable),
    }
}
