//! Focused unit tests covering reconcile CLI settings and runs.

use super::helpers::{ListingFiles, StubBuilder};
use super::*;
use crate::reconcile::{
    ReconcileArgs, ReconcileSettings, run_reconcile_with, settings_from_layers_for_test,
};
use camino::Utf8PathBuf;
use corral_core::{MergedEntity, SourceId, TieBreak};
use rstest::rstest;
use std::time::Duration;

fn args_with(files: &ListingFiles) -> ReconcileArgs {
    ReconcileArgs {
        inputs: vec![files.listings().to_path_buf()],
        output: Some(files.output().to_path_buf()),
        ..ReconcileArgs::default()
    }
}

#[rstest]
fn converting_without_inputs_errors() {
    let args = ReconcileArgs {
        output: Some(Utf8PathBuf::from("stores.json")),
        ..ReconcileArgs::default()
    };
    let err = ReconcileSettings::try_from(args).expect_err("missing inputs should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(env, ENV_INPUT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_without_output_errors() {
    let args = ReconcileArgs {
        inputs: vec![Utf8PathBuf::from("listings.json")],
        ..ReconcileArgs::default()
    };
    let err = ReconcileSettings::try_from(args).expect_err("missing output should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_OUTPUT);
            assert_eq!(env, ENV_OUTPUT);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn overrides_reach_engine_settings() {
    let files = ListingFiles::new();
    let args = ReconcileArgs {
        threshold: Some(0.8),
        link_floor: Some(0.6),
        tie_break: Some("most-recent".into()),
        ranking: Some("yelp, osm".into()),
        geocode_concurrency: Some(2),
        geocode_timeout_secs: Some(3),
        nominatim_url: Some("http://localhost:8080".into()),
        ..args_with(&files)
    };
    let settings = ReconcileSettings::try_from(args).expect("settings should build");
    let merge = &settings.engine.merge;
    assert!((merge.threshold - 0.8).abs() < f64::EPSILON);
    assert!((merge.link_floor - 0.6).abs() < f64::EPSILON);
    assert_eq!(merge.tie_break, TieBreak::MostRecent);
    assert_eq!(merge.ranking, vec![SourceId::Yelp, SourceId::Osm]);
    assert_eq!(settings.engine.geocode.concurrency, 2);
    assert_eq!(settings.engine.geocode.timeout, Duration::from_secs(3));
    assert_eq!(settings.nominatim.timeout, Duration::from_secs(3));
    assert_eq!(settings.nominatim.base_url, "http://localhost:8080");
}

#[rstest]
fn unknown_tie_break_is_rejected() {
    let files = ListingFiles::new();
    let args = ReconcileArgs {
        tie_break: Some("coin_flip".into()),
        ..args_with(&files)
    };
    let err = ReconcileSettings::try_from(args).expect_err("unknown rule should error");
    assert!(matches!(err, CliError::TieBreak(_)), "found {err:?}");
}

#[rstest]
fn unknown_ranking_source_is_rejected() {
    let files = ListingFiles::new();
    let args = ReconcileArgs {
        ranking: Some("osm,foursquare".into()),
        ..args_with(&files)
    };
    let err = ReconcileSettings::try_from(args).expect_err("unknown source should error");
    assert!(matches!(err, CliError::Ranking(_)), "found {err:?}");
}

#[rstest]
#[case(Some(1.5), None)]
#[case(None, Some(-0.1))]
fn out_of_range_settings_are_fatal(#[case] threshold: Option<f64>, #[case] floor: Option<f64>) {
    let files = ListingFiles::new();
    let args = ReconcileArgs {
        threshold,
        link_floor: floor,
        ..args_with(&files)
    };
    let err = ReconcileSettings::try_from(args).expect_err("invalid settings should error");
    assert!(matches!(err, CliError::Settings(_)), "found {err:?}");
}

#[rstest]
fn validate_sources_reports_missing_files() {
    let files = ListingFiles::new();
    let args = ReconcileArgs {
        inputs: vec![files.root().join("missing.json")],
        ..args_with(&files)
    };
    let settings = ReconcileSettings::try_from(args).expect("settings should build");
    let err = settings.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_INPUT),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let files = ListingFiles::new();
    let args = ReconcileArgs {
        inputs: vec![files.root().to_path_buf()],
        ..args_with(&files)
    };
    let settings = ReconcileSettings::try_from(args).expect("settings should build");
    let err = settings.validate_sources().expect_err("expected failure");
    assert!(
        matches!(err, CliError::SourcePathNotFile { field, .. } if field == ARG_INPUT),
        "found {err:?}"
    );
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "threshold": "high" }));

    let err = settings_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let files = ListingFiles::new();
    let env_output = files.root().join("from-env.json");
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "output": files.root().join("from-file.json").as_str(),
            "threshold": 0.8,
            "tie_break": "first_listed",
        }),
        None,
    );
    composer.push_environment(json!({
        "output": env_output.as_str(),
        "tie_break": "most_recent",
    }));
    composer.push_cli(json!({
        "inputs": [files.listings().as_str()],
    }));

    let settings =
        settings_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(settings.inputs, vec![files.listings().to_path_buf()]);
    assert_eq!(settings.output, env_output);
    assert!((settings.engine.merge.threshold - 0.8).abs() < f64::EPSILON);
    assert_eq!(settings.engine.merge.tie_break, TieBreak::MostRecent);
}

#[rstest]
fn reconcile_writes_entities_and_summary() {
    let files = ListingFiles::new();
    let mut summary = Vec::new();
    run_reconcile_with(args_with(&files), &StubBuilder, &mut summary)
        .expect("reconcile should succeed");

    let written = std::fs::read_to_string(files.output().as_std_path()).expect("read output");
    let entities: Vec<MergedEntity> = serde_json::from_str(&written).expect("entities decode");
    assert_eq!(entities.len(), 1);
    let members: Vec<SourceId> = entities
        .iter()
        .flat_map(|entity| entity.members.iter().map(|member| member.key.source))
        .collect();
    assert_eq!(members, vec![SourceId::Osm, SourceId::Yelp]);

    let printed = String::from_utf8(summary).expect("utf-8 summary");
    assert!(printed.contains("ingested:     2"), "{printed}");
    assert!(printed.contains("entities:     1"), "{printed}");
}
