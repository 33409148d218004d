//! Order-insensitive string similarity.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Token-set similarity between two whitespace-separated strings.
///
/// Both inputs are split into sorted, deduplicated token sets. The shared
/// tokens are compared with each side's full set, and the best normalised
/// Levenshtein ratio wins, so word order and repeated words do not matter and
/// a name whose tokens are a subset of the other's scores `1.0`.
///
/// Returns `0.0` when either side has no tokens.
///
/// # Examples
///
/// ```
/// use corral_matcher::token_set_similarity;
///
/// assert_eq!(token_set_similarity("boot barn", "barn boot"), 1.0);
/// assert_eq!(token_set_similarity("boot barn", "boot barn fort worth"), 1.0);
/// assert!(token_set_similarity("boot barn", "cavenders") < 0.5);
/// ```
#[must_use]
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = join(left.intersection(&right).copied());
    let left_only = join(left.difference(&right).copied());
    let right_only = join(right.difference(&left).copied());
    let with_left = concat(&shared, &left_only);
    let with_right = concat(&shared, &right_only);

    let mut best = normalized_levenshtein(&with_left, &with_right);
    if !shared.is_empty() {
        best = best
            .max(normalized_levenshtein(&shared, &with_left))
            .max(normalized_levenshtein(&shared, &with_right));
    }
    best
}

fn join<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_owned(),
        (_, true) => head.to_owned(),
        _ => format!("{head} {tail}"),
    }
}
