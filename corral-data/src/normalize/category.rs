//! Keyword-based category classification.

use std::collections::BTreeMap;

use corral_core::Category;

use super::text::tokens;

/// Confidence when exactly one category matched.
const SINGLE_HIT_CONFIDENCE: f64 = 0.8;
/// Confidence when several categories matched.
const MULTI_HIT_CONFIDENCE: f64 = 0.6;
/// Confidence when nothing matched.
const NO_HIT_CONFIDENCE: f64 = 0.2;

/// Classify a listing from its descriptive texts.
///
/// Terms match whole words, so `hat` does not fire on `chattanooga`.
/// Exactly one matching category wins; several or none give
/// [`Category::Mixed`].
pub(crate) fn classify<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    keywords: &BTreeMap<Category, Vec<String>>,
) -> (Category, f64) {
    let haystack = format!(
        " {} ",
        texts
            .into_iter()
            .flat_map(tokens)
            .collect::<Vec<_>>()
            .join(" ")
    );
    let hits: Vec<Category> = keywords
        .iter()
        .filter(|(_, terms)| {
            terms.iter().any(|term| {
                let needle = tokens(term).join(" ");
                !needle.is_empty() && haystack.contains(&format!(" {needle} "))
            })
        })
        .map(|(category, _)| *category)
        .collect();
    match hits.as_slice() {
        [single] => (*single, SINGLE_HIT_CONFIDENCE),
        [] => (Category::Mixed, NO_HIT_CONFIDENCE),
        _ => (Category::Mixed, MULTI_HIT_CONFIDENCE),
    }
}
