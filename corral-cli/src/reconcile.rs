//! Reconcile command implementation for the Corral CLI.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use corral_core::{EntitySink, Geocoder, RecordSource, SourceId, TieBreak};
use corral_data::geocode::DEFAULT_BASE_URL;
use corral_data::{JsonEntitySink, JsonRecordSource, NominatimConfig, NominatimGeocoder};
use corral_engine::{Pipeline, ReconcileConfig, RunReport};
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    ARG_GEOCODE_CONCURRENCY, ARG_GEOCODE_TIMEOUT_SECS, ARG_INPUT, ARG_LINK_FLOOR,
    ARG_NOMINATIM_URL, ARG_OUTPUT, ARG_RANKING, ARG_REVIEW_SPREAD, ARG_THRESHOLD, ARG_TIE_BREAK,
    ARG_USER_AGENT, CliError, ENV_INPUT, ENV_OUTPUT,
};

/// CLI arguments for the `reconcile` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Reconcile raw listings exported by the fetch adapters. Each \
                 input is a JSON array of raw records; the merged stores are \
                 written as pretty JSON and a run summary is printed. Settings \
                 can come from CLI flags, configuration files, or environment \
                 variables.",
    about = "Merge provider listings into deduplicated stores"
)]
#[ortho_config(prefix = "CORRAL")]
pub(crate) struct ReconcileArgs {
    /// JSON files containing raw records.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) inputs: Vec<Utf8PathBuf>,
    /// Destination for the merged entities.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Root URL of the Nominatim service.
    #[arg(long = ARG_NOMINATIM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_url: Option<String>,
    /// User agent sent to the geocoder.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    /// Score at or above which a pair is merged.
    #[arg(long = ARG_THRESHOLD, value_name = "score")]
    #[serde(default)]
    pub(crate) threshold: Option<f64>,
    /// Lowest score allowed between any two members of a cluster.
    #[arg(long = ARG_LINK_FLOOR, value_name = "score")]
    #[serde(default)]
    pub(crate) link_floor: Option<f64>,
    /// Internal score spread above which a cluster is flagged.
    #[arg(long = ARG_REVIEW_SPREAD, value_name = "spread")]
    #[serde(default)]
    pub(crate) review_spread: Option<f64>,
    /// Rule for equal-rank, equal-confidence conflicts
    /// (`first_listed`, `most_recent` or `flag_for_review`).
    #[arg(long = ARG_TIE_BREAK, value_name = "rule")]
    #[serde(default)]
    pub(crate) tie_break: Option<String>,
    /// Comma-separated source precedence, highest first.
    #[arg(long = ARG_RANKING, value_name = "sources")]
    #[serde(default)]
    pub(crate) ranking: Option<String>,
    /// Geocoder calls in flight at once.
    #[arg(long = ARG_GEOCODE_CONCURRENCY, value_name = "count")]
    #[serde(default)]
    pub(crate) geocode_concurrency: Option<usize>,
    /// Per-call geocoder timeout in seconds.
    #[arg(long = ARG_GEOCODE_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) geocode_timeout_secs: Option<u64>,
}

impl ReconcileArgs {
    pub(crate) fn into_settings(self) -> Result<ReconcileSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReconcileSettings::try_from(merged)
    }
}

/// Resolved `reconcile` command settings.
#[derive(Debug, Clone)]
pub(crate) struct ReconcileSettings {
    /// Raw record files, read in order.
    pub(crate) inputs: Vec<Utf8PathBuf>,
    /// Entity output file.
    pub(crate) output: Utf8PathBuf,
    /// Geocoder client settings.
    pub(crate) nominatim: NominatimConfig,
    /// Engine settings, already validated.
    pub(crate) engine: ReconcileConfig,
}

impl ReconcileSettings {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        for input in &self.inputs {
            Self::require_existing(input, ARG_INPUT)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match corral_fs::is_regular_file(path) {
            Ok(true) => Ok(()),
            Ok(false) if path.exists() => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<ReconcileArgs> for ReconcileSettings {
    type Error = CliError;

    fn try_from(args: ReconcileArgs) -> Result<Self, Self::Error> {
        if args.inputs.is_empty() {
            return Err(CliError::MissingArgument {
                field: ARG_INPUT,
                env: ENV_INPUT,
            });
        }
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_OUTPUT,
        })?;

        let mut engine = ReconcileConfig::default();
        if let Some(threshold) = args.threshold {
            engine.merge.threshold = threshold;
        }
        if let Some(link_floor) = args.link_floor {
            engine.merge.link_floor = link_floor;
        }
        if let Some(review_spread) = args.review_spread {
            engine.merge.review_spread = review_spread;
        }
        if let Some(rule) = args.tie_break {
            engine.merge.tie_break = rule.parse::<TieBreak>()?;
        }
        if let Some(ranking) = args.ranking {
            engine.merge.ranking = parse_ranking(&ranking)?;
        }
        if let Some(concurrency) = args.geocode_concurrency {
            engine.geocode.concurrency = concurrency;
        }
        if let Some(seconds) = args.geocode_timeout_secs {
            engine.geocode.timeout = Duration::from_secs(seconds);
        }
        engine.validate()?;

        let mut nominatim =
            NominatimConfig::new(args.nominatim_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()))
                .with_timeout(engine.geocode.timeout);
        if let Some(agent) = args.user_agent {
            nominatim = nominatim.with_user_agent(agent);
        }

        Ok(Self {
            inputs: args.inputs,
            output,
            nominatim,
            engine,
        })
    }
}

/// Parse a comma-separated list of source identifiers.
fn parse_ranking(list: &str) -> Result<Vec<SourceId>, CliError> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.parse::<SourceId>().map_err(CliError::from))
        .collect()
}

/// Builds the geocoder for the current reconcile invocation.
pub(super) trait GeocoderBuilder {
    /// Geocoder handed to the pipeline.
    type Geocoder: Geocoder;

    fn build(&self, settings: &ReconcileSettings) -> Result<Self::Geocoder, CliError>;
}

pub(super) struct NominatimBuilder;

impl GeocoderBuilder for NominatimBuilder {
    type Geocoder = NominatimGeocoder;

    fn build(&self, settings: &ReconcileSettings) -> Result<Self::Geocoder, CliError> {
        NominatimGeocoder::with_config(settings.nominatim.clone()).map_err(|source| {
            CliError::BuildGeocoder {
                base_url: settings.nominatim.base_url.clone(),
                source,
            }
        })
    }
}

pub(super) fn run_reconcile(args: ReconcileArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_reconcile_with(args, &NominatimBuilder, &mut stdout)
}

pub(super) fn run_reconcile_with<B: GeocoderBuilder>(
    args: ReconcileArgs,
    builder: &B,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let settings = resolve_settings(args)?;
    let report = execute_reconcile(&settings, builder)?;
    JsonEntitySink::new(settings.output.clone()).write(&report.entities)?;
    info!(
        "wrote {} entities to {}",
        report.entities.len(),
        settings.output
    );
    write!(writer, "{}", report.summary).map_err(CliError::WriteSummary)
}

pub(super) fn resolve_settings(args: ReconcileArgs) -> Result<ReconcileSettings, CliError> {
    let settings = args.into_settings()?;
    settings.validate_sources()?;
    Ok(settings)
}

fn execute_reconcile<B: GeocoderBuilder>(
    settings: &ReconcileSettings,
    builder: &B,
) -> Result<RunReport, CliError> {
    let geocoder = builder.build(settings)?;
    let pipeline = Pipeline::new(settings.engine.clone(), geocoder)?;
    let sources: Vec<JsonRecordSource> = settings
        .inputs
        .iter()
        .map(|path| JsonRecordSource::new(path.clone()))
        .collect();
    let refs: Vec<&dyn RecordSource> = sources
        .iter()
        .map(|source| source as &dyn RecordSource)
        .collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; abandoning the run");
            interrupt.cancel();
        }
    });
    let report = runtime.block_on(pipeline.run_sources(&refs, &cancel))?;
    runtime.shutdown_background();
    Ok(report)
}

#[cfg(test)]
pub(crate) fn settings_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ReconcileSettings, CliError> {
    let merged = ReconcileArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ReconcileSettings::try_from(merged)
}
