//! Name clean-up and match-key derivation.

/// Placeholder names some providers emit for unnamed listings.
const PLACEHOLDER_NAMES: [&str; 3] = ["unknown", "unnamed", "n/a"];

/// Words that introduce a store number, as in `No. 12` or `Store 7`.
const STORE_NUMBER_MARKERS: [&str; 5] = ["#", "no", "store", "unit", "location"];

/// Multi-word generic suffixes, checked before the single-word ones.
const PHRASE_SUFFIXES: [[&str; 2]; 2] = [["western", "wear"], ["boot", "store"]];

/// Legal and generic single-word suffixes.
const WORD_SUFFIXES: [&str; 8] = ["inc", "llc", "ltd", "corp", "co", "store", "shop", "boots"];

/// Collapse runs of whitespace to single spaces and trim the ends.
pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Display form of a provider name, or `None` for blank and placeholder
/// names.
pub(crate) fn display_name(raw: &str) -> Option<String> {
    let name = collapse_whitespace(raw);
    let lowered = name.to_lowercase();
    if name.is_empty() || PLACEHOLDER_NAMES.contains(&lowered.as_str()) {
        return None;
    }
    Some(name)
}

/// Lower-case words with apostrophes dropped, `#` kept as its own token and
/// every other punctuation mark treated as a separator.
pub(crate) fn tokens(raw: &str) -> Vec<String> {
    let mut spaced = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\'' | '\u{2019}' => {}
            '#' => spaced.push_str(" # "),
            c if c.is_alphanumeric() => spaced.extend(c.to_lowercase()),
            _ => spaced.push(' '),
        }
    }
    spaced.split_whitespace().map(str::to_owned).collect()
}

/// Case-folded match key for a display name.
///
/// Store numbers (`#4521`, `No. 12`, `Store 7`) are removed first, then
/// trailing legal and generic suffixes are peeled off one at a time. A suffix
/// is kept when removing it would leave the key empty. A name that is nothing
/// but a store number keeps its number, and one with no words at all keeps its
/// lower-cased text, so the key is never empty.
pub(crate) fn name_key(display: &str) -> String {
    let all = tokens(display);
    let mut words = strip_store_numbers(all.clone());
    if words.is_empty() {
        words = all.into_iter().filter(|word| word != "#").collect();
    }
    if words.is_empty() {
        return collapse_whitespace(display).to_lowercase();
    }
    loop {
        let phrase_hit = PHRASE_SUFFIXES
            .iter()
            .any(|phrase| words.len() > phrase.len() && words.ends_with(&phrase.map(str::to_owned)));
        if phrase_hit {
            words.truncate(words.len() - 2);
            continue;
        }
        let word_hit = words.len() > 1
            && words
                .last()
                .is_some_and(|last| WORD_SUFFIXES.contains(&last.as_str()));
        if word_hit {
            words.pop();
            continue;
        }
        break;
    }
    words.join(" ")
}

fn strip_store_numbers(words: Vec<String>) -> Vec<String> {
    let mut kept = Vec::with_capacity(words.len());
    let mut iter = words.into_iter().peekable();
    while let Some(word) = iter.next() {
        let numbered = STORE_NUMBER_MARKERS.contains(&word.as_str())
            && iter.peek().is_some_and(|next| is_number(next));
        if numbered {
            iter.next();
            continue;
        }
        if word != "#" {
            kept.push(word);
        }
    }
    kept
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// Title-case each word: `FORT WORTH` becomes `Fort Worth`.
pub(crate) fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
