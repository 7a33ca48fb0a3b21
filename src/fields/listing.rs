//! Price level, categories, opening hours and closure status

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{always, candidates, first_match, group1, Rule, Surface};
use crate::dedup::{name_key, Deduplicator};
use crate::markup;
use crate::records::Hours;
use crate::validate::is_valid_category;
use crate::window::ContextWindow;

const MAX_CATEGORIES: usize = 5;

/// Separators between the tokens of a listing's summary line
const SEGMENT_DELIMITERS: &[char] = &['·', '•', '⋅', '|'];

static PRICE_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""priceRange"\s*:\s*"([$€£¥₩]{1,4})""#).expect("Invalid price JSON regex")
});

static PRICE_ARIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)aria-label="(?:price(?: level)?:?\s*)?(inexpensive|moderately expensive|expensive|very expensive)""#)
        .expect("Invalid price aria regex")
});

/// A run of currency symbols standing alone, not glued to an amount
static PRICE_SYMBOLS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^$€£¥₩\w])([$€£¥₩]{1,4})(?:\s*[·•⋅|,]|\s+[^\d\s]|$)")
        .expect("Invalid price symbol regex")
});

static CATEGORY_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:categories|servesCuisine)"\s*:\s*\[([^\]]{2,400})\]"#)
        .expect("Invalid category JSON regex")
});

static CATEGORY_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:class="[^"]*\bcategory\b[^"]*"|jsaction="[^"]*\.category[^"]*")[^>]*>\s*([^<]{2,50})<"#)
        .expect("Invalid category class regex")
});

static JSON_STRING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]{2,50})""#).expect("Invalid JSON string regex")
});

static HOURS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|",
        r"mon|tues?|wed|thu(?:rs?)?|fri|sat|sun)\b\.?\s*[,:]?\s*",
        r"(closed|open 24 hours|",
        r"[0-9]{1,2}(?::[0-9]{2})?\s*(?:[ap]\.?m\.?)?\s*(?:–|-|to)\s*[0-9]{1,2}(?::[0-9]{2})?\s*(?:[ap]\.?m\.?)?)",
    ))
    .expect("Invalid hours regex")
});

static PERMANENTLY_CLOSED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bpermanently\s+closed\b").expect("Invalid closed regex")
});

static CLOSED_STATUS_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:permanently_closed"\s*:\s*true|business_status"\s*:\s*"CLOSED_PERMANENTLY")"#)
        .expect("Invalid closed JSON regex")
});

/// Ranked rules for the price level
pub static PRICE_RULES: &[Rule<String>] = &[
    Rule {
        name: "price_json",
        surface: Surface::Raw,
        pattern: &PRICE_JSON_RE,
        transform: group1,
        accept: plausible_price,
    },
    Rule {
        name: "price_aria_label",
        surface: Surface::Raw,
        pattern: &PRICE_ARIA_RE,
        transform: price_from_words,
        accept: plausible_price,
    },
    Rule {
        name: "price_symbols",
        surface: Surface::Text,
        pattern: &PRICE_SYMBOLS_RE,
        transform: group1,
        accept: plausible_price,
    },
];

/// Structured category sources; delimiter segmentation of the summary line
/// runs after these
pub static CATEGORY_RULES: &[Rule<Vec<String>>] = &[
    Rule {
        name: "categories_json",
        surface: Surface::Raw,
        pattern: &CATEGORY_JSON_RE,
        transform: |caps| {
            let list = JSON_STRING_RE
                .captures_iter(&caps[1])
                .map(|c| markup::decode_entities(&c[1]))
                .collect::<Vec<_>>();
            Some(list)
        },
        accept: |list| !list.is_empty(),
    },
    Rule {
        name: "categories_class_hint",
        surface: Surface::Raw,
        pattern: &CATEGORY_CLASS_RE,
        transform: |caps| Some(vec![markup::collapse_whitespace(&markup::decode_entities(&caps[1]))]),
        accept: |list| !list.is_empty(),
    },
];

/// One `(day, hours)` line per match
pub static HOURS_RULES: &[Rule<(String, String)>] = &[
    Rule {
        name: "hours_markup",
        surface: Surface::Raw,
        pattern: &HOURS_RE,
        transform: day_hours,
        accept: always,
    },
    Rule {
        name: "hours_text",
        surface: Surface::Text,
        pattern: &HOURS_RE,
        transform: day_hours,
        accept: always,
    },
];

pub static CLOSED_RULES: &[Rule<bool>] = &[
    Rule {
        name: "closed_status_json",
        surface: Surface::Raw,
        pattern: &CLOSED_STATUS_JSON_RE,
        transform: |_| Some(true),
        accept: always,
    },
    Rule {
        name: "closed_text",
        surface: Surface::Text,
        pattern: &PERMANENTLY_CLOSED_RE,
        transform: |_| Some(true),
        accept: always,
    },
];

pub fn extract_price_level(window: &ContextWindow<'_>) -> Option<String> {
    first_match(PRICE_RULES, window)
}

/// Up to five distinct categories, never repeating the entity's own name
pub fn extract_categories(window: &ContextWindow<'_>, name: &str) -> Vec<String> {
    let mut seen = Deduplicator::new();
    seen.add(&name_key(name));

    let structured = candidates(CATEGORY_RULES, window).flatten();
    let segmented = delimited_segments(window.raw);

    let mut categories = Vec::new();
    for token in structured.chain(segmented) {
        let token = token.trim();
        if !is_valid_category(token) || !seen.add(&name_key(token)) {
            continue;
        }
        categories.push(token.to_string());
        if categories.len() == MAX_CATEGORIES {
            break;
        }
    }
    categories
}

/// Day to hours, keyed by full day name; the first line for a day wins
pub fn extract_hours(window: &ContextWindow<'_>) -> Option<Hours> {
    let mut hours = Hours::new();
    for (day, range) in candidates(HOURS_RULES, window) {
        hours.entry(day).or_insert(range);
    }
    (!hours.is_empty()).then_some(hours)
}

pub fn extract_permanently_closed(window: &ContextWindow<'_>) -> bool {
    first_match(CLOSED_RULES, window).unwrap_or(false)
}

/// Text tokens that sit next to a summary-line delimiter.
///
/// Token boundaries follow both the delimiters and the markup's text nodes,
/// so `<span>4.5</span> · <span>Pizza</span>` yields `4.5` and `Pizza`.
fn delimited_segments(raw: &str) -> Vec<String> {
    // None marks a delimiter
    let mut tokens: Vec<Option<String>> = Vec::new();
    for node in markup::text_nodes(raw) {
        for (i, piece) in node.text.split(SEGMENT_DELIMITERS).enumerate() {
            if i > 0 {
                tokens.push(None);
            }
            let piece = piece.trim();
            if !piece.is_empty() {
                tokens.push(Some(piece.to_string()));
            }
        }
    }

    tokens
        .iter()
        .enumerate()
        .filter_map(|(i, token)| {
            let text = token.as_ref()?;
            let after_delimiter = i > 0 && tokens[i - 1].is_none();
            let before_delimiter = matches!(tokens.get(i + 1), Some(None));
            (after_delimiter || before_delimiter).then(|| text.clone())
        })
        .collect()
}

fn plausible_price(price: &String) -> bool {
    let count = price.chars().count();
    (1..=4).contains(&count)
        && price
            .chars()
            .all(|c| matches!(c, '$' | '€' | '£' | '¥' | '₩'))
}

fn price_from_words(caps: &Captures<'_>) -> Option<String> {
    let level = match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "inexpensive" => "$",
        "moderately expensive" => "$$",
        "expensive" => "$$$",
        "very expensive" => "$$$$",
        _ => return None,
    };
    Some(level.to_string())
}

fn day_hours(caps: &Captures<'_>) -> Option<(String, String)> {
    let day = full_day_name(caps.get(1)?.as_str())?;
    let range = markup::collapse_whitespace(caps.get(2)?.as_str());
    let range = match range.to_ascii_lowercase().as_str() {
        "closed" => "Closed".to_string(),
        "open 24 hours" => "Open 24 hours".to_string(),
        _ => range,
    };
    Some((day.to_string(), range))
}

fn full_day_name(day: &str) -> Option<&'static str> {
    let lower = day.to_ascii_lowercase();
    let name = match lower.get(..3)? {
        "mon" => "Monday",
        "tue" => "Tuesday",
        "wed" => "Wednesday",
        "thu" => "Thursday",
        "fri" => "Friday",
        "sat" => "Saturday",
        "sun" => "Sunday",
        _ => return None,
    };
    Some(name)
}
