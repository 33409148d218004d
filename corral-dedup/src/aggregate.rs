//! Stable output ordering for merged entities.

use std::cmp::Ordering;

use corral_core::{Attributed, MergedEntity};

/// Order entities by state, city and name, then by cluster id.
///
/// Comparisons are case-insensitive. Entities without a state or city sort
/// after those with one. Contents are returned untouched.
///
/// # Examples
///
/// ```
/// use corral_dedup::aggregate;
///
/// assert!(aggregate(Vec::new()).is_empty());
/// ```
#[must_use]
pub fn aggregate(mut entities: Vec<MergedEntity>) -> Vec<MergedEntity> {
    entities.sort_by(|a, b| {
        by_optional(a.fields.state.as_ref(), b.fields.state.as_ref())
            .then_with(|| by_optional(a.fields.city.as_ref(), b.fields.city.as_ref()))
            .then_with(|| folded(&a.fields.name.value).cmp(&folded(&b.fields.name.value)))
            .then_with(|| a.id.cmp(&b.id))
    });
    entities
}

fn folded(value: &str) -> String {
    value.to_lowercase()
}

fn by_optional(a: Option<&Attributed<String>>, b: Option<&Attributed<String>>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => folded(&left.value).cmp(&folded(&right.value)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
