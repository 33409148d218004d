//! End-to-end reconciliation run.

use corral_core::{
    ConfigError, Geocoder, MergedEntity, RawRecord, ReconcileConfig, RecordSource,
    RecordSourceError, Rejection, RunSummary,
};
use corral_data::{GeocodeResolver, Normalizer, ResolveError};
use corral_dedup::{MergeEngine, aggregate};
use corral_matcher::SimilarityMatcher;
use log::{info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that stop a run.
///
/// Per-record problems never appear here; they are reported as rejections
/// or review flags in the [`RunReport`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration is invalid.
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    /// A record source could not be loaded.
    #[error("failed to load records from {source_name}")]
    Source {
        /// Source description.
        source_name: String,
        /// Underlying failure.
        #[source]
        source: RecordSourceError,
    },
    /// Geocode resolution was abandoned.
    #[error("geocode resolution did not complete")]
    Resolve(#[from] ResolveError),
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Merged entities in output order.
    pub entities: Vec<MergedEntity>,
    /// Records skipped by the normaliser, in input order.
    pub rejections: Vec<Rejection>,
    /// Outcome counts.
    pub summary: RunSummary,
}

/// Normalise, geocode, merge and order one batch of listings.
///
/// The geocode cache lives as long as the pipeline, so repeated runs over
/// overlapping batches only look each address up once.
///
/// # Examples
///
/// ```
/// use corral_data::geocode::test_support::StubGeocoder;
/// use corral_engine::{Pipeline, ReconcileConfig};
/// use tokio_util::sync::CancellationToken;
///
/// let pipeline = Pipeline::new(ReconcileConfig::default(), StubGeocoder::new())
///     .expect("default configuration is valid");
/// let runtime = tokio::runtime::Builder::new_current_thread()
///     .enable_all()
///     .build()
///     .expect("runtime");
/// let report = runtime
///     .block_on(pipeline.run(Vec::new(), &CancellationToken::new()))
///     .expect("empty run succeeds");
/// assert!(report.entities.is_empty());
/// assert_eq!(report.summary.ingested, 0);
/// ```
#[derive(Debug)]
pub struct Pipeline<G> {
    config: ReconcileConfig,
    normalizer: Normalizer,
    resolver: GeocodeResolver<G>,
    engine: MergeEngine<SimilarityMatcher>,
}

impl<G: Geocoder> Pipeline<G> {
    /// Validate `config` and assemble the stages.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when any setting is out of range.
    pub fn new(config: ReconcileConfig, geocoder: G) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(config.normalize.clone()),
            resolver: GeocodeResolver::new(geocoder, config.geocode.clone()),
            engine: MergeEngine::new(
                SimilarityMatcher::new(config.matching.clone()),
                config.merge.clone(),
            ),
            config,
        })
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile `raws`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Resolve`] when `cancel` fires during geocode
    /// resolution. No entities are produced in that case.
    pub async fn run(
        &self,
        raws: Vec<RawRecord>,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let ingested = raws.len();
        let normalized = self.normalizer.normalize_batch(raws);
        let resolved = self
            .resolver
            .resolve_batch(normalized.records, cancel)
            .await?;
        info!(
            "geocoding issued {} lookups ({} answered from cache)",
            resolved.lookups, resolved.cache_hits
        );
        let entities = aggregate(self.engine.merge(resolved.records));
        let summary = RunSummary::from_run(ingested, &normalized.rejections, &entities);
        if summary.flagged > 0 {
            warn!("{} entities need manual review", summary.flagged);
        }
        Ok(RunReport {
            entities,
            rejections: normalized.rejections,
            summary,
        })
    }

    /// Load every source in order, then reconcile the combined batch.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Source`] for the first source that fails to
    /// load, or any error from [`Pipeline::run`].
    pub async fn run_sources(
        &self,
        sources: &[&dyn RecordSource],
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let mut raws = Vec::new();
        for source in sources {
            let batch = source.load().map_err(|source_err| PipelineError::Source {
                source_name: source.describe(),
                source: source_err,
            })?;
            info!("loaded {} records from {}", batch.len(), source.describe());
            raws.extend(batch);
        }
        self.run(raws, cancel).await
    }
}
