//! Behavioural coverage for configuration validation.

use std::cell::RefCell;

use corral_core::{ConfigError, ReconcileConfig, SourceId};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

type ResultCell = RefCell<Option<Result<(), ConfigError>>>;

#[fixture]
fn config() -> RefCell<ReconcileConfig> {
    RefCell::new(ReconcileConfig::default())
}

#[fixture]
fn outcome() -> ResultCell {
    RefCell::new(None)
}

#[given("the default reconciliation configuration")]
fn default_config(#[from(config)] config: &RefCell<ReconcileConfig>) {
    *config.borrow_mut() = ReconcileConfig::default();
}

#[given("a merge threshold of {threshold}")]
fn merge_threshold(#[from(config)] config: &RefCell<ReconcileConfig>, threshold: f64) {
    config.borrow_mut().merge.threshold = threshold;
}

#[given("a link floor of {floor}")]
fn link_floor(#[from(config)] config: &RefCell<ReconcileConfig>, floor: f64) {
    config.borrow_mut().merge.link_floor = floor;
}

#[given("a source ranking of {ranking}")]
fn set_ranking(#[from(config)] config: &RefCell<ReconcileConfig>, ranking: String) {
    let sources = ranking
        .split(',')
        .map(|raw| {
            raw.parse::<SourceId>()
                .unwrap_or_else(|err| panic!("scenario ranking must parse: {err}"))
        })
        .collect();
    config.borrow_mut().merge.ranking = sources;
}

#[when("I validate the configuration")]
fn validate(
    #[from(config)] config: &RefCell<ReconcileConfig>,
    #[from(outcome)] outcome: &ResultCell,
) {
    *outcome.borrow_mut() = Some(config.borrow().validate());
}

#[then("validation succeeds")]
fn succeeds(#[from(outcome)] outcome: &ResultCell) {
    let borrowed = outcome.borrow();
    assert!(
        matches!(borrowed.as_ref(), Some(Ok(()))),
        "expected success, got {borrowed:?}"
    );
}

#[then("validation fails for field {field}")]
fn fails_for_field(#[from(outcome)] outcome: &ResultCell, field: String) {
    let borrowed = outcome.borrow();
    match borrowed.as_ref() {
        Some(Err(ConfigError::OutOfRange { field: actual, .. })) => assert_eq!(*actual, field),
        other => panic!("expected an out-of-range error, got {other:?}"),
    }
}

#[then("validation fails because the link floor exceeds the threshold")]
fn fails_on_link_floor(#[from(outcome)] outcome: &ResultCell) {
    let borrowed = outcome.borrow();
    assert!(
        matches!(
            borrowed.as_ref(),
            Some(Err(ConfigError::LinkFloorAboveThreshold { .. }))
        ),
        "expected a link floor error, got {borrowed:?}"
    );
}

#[then("validation fails because yelp is ranked twice")]
fn fails_on_duplicate(#[from(outcome)] outcome: &ResultCell) {
    let borrowed = outcome.borrow();
    assert_eq!(
        borrowed.as_ref(),
        Some(&Err(ConfigError::DuplicateRanking {
            duplicate: SourceId::Yelp
        }))
    );
}

#[scenario(path = "tests/features/validate_config.feature", index = 0)]
fn accepting_defaults(config: RefCell<ReconcileConfig>, outcome: ResultCell) {
    let _ = (config, outcome);
}

#[scenario(path = "tests/features/validate_config.feature", index = 1)]
fn rejecting_high_threshold(config: RefCell<ReconcileConfig>, outcome: ResultCell) {
    let _ = (config, outcome);
}

#[scenario(path = "tests/features/validate_config.feature", index = 2)]
fn rejecting_high_link_floor(config: RefCell<ReconcileConfig>, outcome: ResultCell) {
    let _ = (config, outcome);
}

#[scenario(path = "tests/features/validate_config.feature", index = 3)]
fn rejecting_duplicate_ranking(config: RefCell<ReconcileConfig>, outcome: ResultCell) {
    let _ = (config, outcome);
}
