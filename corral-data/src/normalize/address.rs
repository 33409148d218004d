//! Street, locality and phone normalisation.

use super::text::{collapse_whitespace, title_case};

/// Street suffix abbreviations and their expansions.
const STREET_SUFFIXES: [(&str, &str); 17] = [
    ("st", "street"),
    ("ave", "avenue"),
    ("av", "avenue"),
    ("rd", "road"),
    ("dr", "drive"),
    ("blvd", "boulevard"),
    ("ln", "lane"),
    ("hwy", "highway"),
    ("pkwy", "parkway"),
    ("ct", "court"),
    ("cir", "circle"),
    ("pl", "place"),
    ("ste", "suite"),
    ("trl", "trail"),
    ("fwy", "freeway"),
    ("expy", "expressway"),
    ("sq", "square"),
];

const DIRECTIONALS: [(&str, &str); 8] = [
    ("n", "north"),
    ("s", "south"),
    ("e", "east"),
    ("w", "west"),
    ("ne", "northeast"),
    ("nw", "northwest"),
    ("se", "southeast"),
    ("sw", "southwest"),
];

/// Words after which a single letter is a unit designator, not a direction.
const UNIT_MARKERS: [&str; 3] = ["suite", "ste", "unit"];

const STATES: [(&str, &str); 51] = [
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("district of columbia", "DC"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// Country names dropped from the end of formatted addresses.
const COUNTRY_SEGMENTS: [&str; 4] = ["usa", "us", "united states", "united states of america"];

fn lookup<'a>(table: &[(&str, &'a str)], word: &str) -> Option<&'a str> {
    table
        .iter()
        .find_map(|(short, long)| (*short == word).then_some(*long))
}

fn is_house_number(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Case-folded street line with suffixes and directionals spelled out.
///
/// `St` directly after the house number and followed by another word reads
/// as `saint` (`100 St Louis Ave` becomes `100 saint louis avenue`).
pub(crate) fn normalize_street(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { ' ' } else { c })
        .collect();
    let words: Vec<String> = collapse_whitespace(&cleaned)
        .to_lowercase()
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();
    if words.is_empty() {
        return None;
    }
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    for (position, word) in words.iter().enumerate() {
        let previous = position.checked_sub(1).and_then(|index| words.get(index));
        let has_next = position + 1 < words.len();
        let after_number = position == 1 && previous.is_some_and(|prev| is_house_number(prev));
        let after_unit = previous.is_some_and(|prev| UNIT_MARKERS.contains(&prev.as_str()));
        let expanded = if word == "st" && after_number && has_next {
            "saint"
        } else if after_unit {
            word.as_str()
        } else if let Some(direction) = lookup(&DIRECTIONALS, word) {
            direction
        } else {
            lookup(&STREET_SUFFIXES, word).unwrap_or(word)
        };
        out.push(expanded.to_owned());
    }
    Some(out.join(" "))
}

/// City in title case.
pub(crate) fn normalize_city(raw: &str) -> Option<String> {
    let city = title_case(raw);
    (!city.is_empty()).then_some(city)
}

/// Two-letter upper-case state code from a code or a full state name.
pub(crate) fn normalize_state(raw: &str) -> Option<String> {
    let lowered = collapse_whitespace(raw).to_lowercase();
    let cleaned = lowered.trim_end_matches('.');
    if cleaned.len() == 2 && cleaned.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(cleaned.to_ascii_uppercase());
    }
    lookup(&STATES, cleaned).map(str::to_owned)
}

/// Leading five digits of a ZIP or ZIP+4 code.
pub(crate) fn normalize_zip(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    (digits.len() >= 5).then(|| digits.chars().take(5).collect())
}

/// Digits-only phone number without the US country code.
pub(crate) fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let national = match digits.strip_prefix('1') {
        Some(rest) if digits.len() == 11 => rest.to_owned(),
        _ => digits,
    };
    (!national.is_empty()).then_some(national)
}

/// Pieces recovered from a single-line postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedAddress {
    pub(crate) street: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) zip: Option<String>,
}

/// Split `100 Main St, Fort Worth, TX 76102, USA` into its parts.
///
/// The trailing `ST 12345` segment yields state and ZIP, the segment before it
/// the city, and the first segment the street when at least three segments
/// remain after dropping the country.
pub(crate) fn parse_formatted_address(raw: &str) -> ParsedAddress {
    let mut segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments
        .last()
        .is_some_and(|last| COUNTRY_SEGMENTS.contains(&last.to_lowercase().as_str()))
    {
        segments.pop();
    }
    let mut parsed = ParsedAddress::default();
    let Some(last) = segments.pop() else {
        return parsed;
    };
    let mut words: Vec<&str> = last.split_whitespace().collect();
    if let Some(zip) = words.last().and_then(|word| normalize_zip(word)) {
        parsed.zip = Some(zip);
        words.pop();
    }
    parsed.state = normalize_state(&words.join(" "));
    if parsed.state.is_none() && parsed.zip.is_none() {
        segments.push(last);
    }
    if parsed.state.is_some() || parsed.zip.is_some() {
        parsed.city = segments.pop().and_then(normalize_city);
    }
    if !segments.is_empty() {
        parsed.street = normalize_street(&segments.join(" "));
    }
    parsed
}
