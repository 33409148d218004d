//! Street and locality agreement.

use corral_core::CanonicalRecord;
use strsim::normalized_levenshtein;

use crate::text::token_set_similarity;

const STREET_SHARE: f64 = 0.6;
const LOCALITY_SHARE: f64 = 0.4;

/// Address similarity in `[0.0, 1.0]`.
///
/// Streets are compared token-wise once house numbers agree; a house number
/// mismatch zeroes the street part. Locality averages ZIP equality and
/// city/state agreement over whichever signals both records carry. When only
/// one part is comparable it carries the full weight; when neither is, the
/// score is `0.0`.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "blends street and locality similarity"
)]
pub fn address_similarity(a: &CanonicalRecord, b: &CanonicalRecord) -> f64 {
    let street = street_similarity(a.street.as_deref(), b.street.as_deref());
    let locality = locality_similarity(a, b);
    match (street, locality) {
        (Some(s), Some(l)) => STREET_SHARE * s + LOCALITY_SHARE * l,
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => 0.0,
    }
}

fn street_similarity(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    let (left, right) = (a?, b?);
    match (house_number(left), house_number(right)) {
        (Some(x), Some(y)) if x != y => Some(0.0),
        _ => Some(token_set_similarity(left, right)),
    }
}

fn house_number(street: &str) -> Option<&str> {
    street
        .split_whitespace()
        .next()
        .filter(|token| token.starts_with(|c: char| c.is_ascii_digit()))
}

#[expect(
    clippy::float_arithmetic,
    reason = "averages the available locality signals"
)]
#[expect(
    clippy::cast_precision_loss,
    reason = "signal count is at most two"
)]
fn locality_similarity(a: &CanonicalRecord, b: &CanonicalRecord) -> Option<f64> {
    let mut signals = Vec::with_capacity(2);
    if let (Some(x), Some(y)) = (&a.zip, &b.zip) {
        signals.push(if x == y { 1.0 } else { 0.0 });
    }
    if let (Some(city_a), Some(state_a), Some(city_b), Some(state_b)) =
        (&a.city, &a.state, &b.city, &b.state)
    {
        signals.push(if state_a.eq_ignore_ascii_case(state_b) {
            normalized_levenshtein(&city_a.to_lowercase(), &city_b.to_lowercase())
        } else {
            0.0
        });
    }
    if signals.is_empty() {
        return None;
    }
    let count = signals.len() as f64;
    Some(signals.iter().sum::<f64>() / count)
}
