//! Address, coordinate and place-id extraction

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{always, first_match, group1, Rule, Surface};
use crate::markup;
use crate::records::Coordinates;
use crate::window::ContextWindow;

const MIN_ADDRESS_CHARS: usize = 10;
const MAX_ADDRESS_CHARS: usize = 200;

static ADDRESS_ARIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)aria-label="address:\s*([^"]{10,200})""#).expect("Invalid address aria regex")
});

static ADDRESS_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:itemprop="(?:streetAddress|address)"|class="[^"]*\baddress\b[^"]*"|data-item-id="address")[^>]*>\s*([^<]{10,200})<"#,
    )
    .expect("Invalid address class regex")
});

static ADDRESS_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:streetAddress|formatted_address|address)"\s*:\s*"([^"]{10,200})""#)
        .expect("Invalid address JSON regex")
});

static ADDRESS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\baddress:\s*([^·•|]{10,200}?)(?:\s+(?:phone|hours|website|open|closed)\b|[·•|]|$)")
        .expect("Invalid address label regex")
});

/// A number, up to five capitalized words, and a street suffix, optionally
/// followed by a unit, city, and state/ZIP
static ADDRESS_STREET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b[0-9]{1,6}[A-Za-z]?\s+(?:[A-Z0-9][\w.'-]*\s+){0,5}?",
        r"(?:St|Street|Ave|Avenue|Rd|Road|Blvd|Boulevard|Dr|Drive|Ln|Lane|Way|Ct|Court|Pl|Place|",
        r"Pkwy|Parkway|Hwy|Highway|Sq|Square|Ter|Terrace|Cir|Circle|Trl|Trail|Broadway)\b\.?",
        r"(?:\s*(?:#|Suite|Ste\.?|Unit|Apt\.?)\s*[\w-]+)?",
        r"(?:,\s*[A-Z][A-Za-z.'-]*(?:\s[A-Z][A-Za-z.'-]*){0,3})?",
        r"(?:,\s*[A-Z]{2}\s+[0-9]{5}(?:-[0-9]{4})?)?",
    ))
    .expect("Invalid street address regex")
});

static COORDS_DATA_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!3d(-?[0-9]{1,3}\.[0-9]+)!4d(-?[0-9]{1,3}\.[0-9]+)").expect("Invalid data path regex")
});

static COORDS_AT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(-?[0-9]{1,3}\.[0-9]{3,}),(-?[0-9]{1,3}\.[0-9]{3,})").expect("Invalid @ coords regex")
});

static COORDS_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""lat(?:itude)?"\s*:\s*"?(-?[0-9]{1,3}(?:\.[0-9]+)?)"?\s*,\s*"(?:lng|lon|longitude)"\s*:\s*"?(-?[0-9]{1,3}(?:\.[0-9]+)?)"#,
    )
    .expect("Invalid coords JSON regex")
});

static COORDS_DATA_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-lat="(-?[0-9]+(?:\.[0-9]+)?)"[^>]*data-(?:lng|lon)="(-?[0-9]+(?:\.[0-9]+)?)""#)
        .expect("Invalid coords attribute regex")
});

static COORDS_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(-?[0-9]{1,3}\.[0-9]+)\s*,\s*(-?[0-9]{1,3}\.[0-9]+)\s*\)")
        .expect("Invalid coords pair regex")
});

static PLACE_ID_CHIJ_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(ChIJ[A-Za-z0-9_-]{16,})").expect("Invalid ChIJ regex")
});

static PLACE_ID_FEATURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(0x[0-9a-f]{6,16}:0x[0-9a-f]{6,16})\b").expect("Invalid feature id regex")
});

static PLACE_ID_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:place_id|placeId)"\s*:\s*"([^"]{6,})""#).expect("Invalid place id JSON regex")
});

static PLACE_ID_CID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:data-cid="|[?&]cid=)([0-9]{6,20})"#).expect("Invalid cid regex")
});

/// Ranked rules for the street address
pub static ADDRESS_RULES: &[Rule<String>] = &[
    Rule {
        name: "address_aria_label",
        surface: Surface::Raw,
        pattern: &ADDRESS_ARIA_RE,
        transform: clean_address,
        accept: plausible_address,
    },
    Rule {
        name: "address_class_hint",
        surface: Surface::Raw,
        pattern: &ADDRESS_CLASS_RE,
        transform: clean_address,
        accept: plausible_address,
    },
    Rule {
        name: "address_json",
        surface: Surface::Raw,
        pattern: &ADDRESS_JSON_RE,
        transform: clean_address,
        accept: plausible_address,
    },
    Rule {
        name: "address_label",
        surface: Surface::Text,
        pattern: &ADDRESS_LABEL_RE,
        transform: clean_address,
        accept: plausible_address,
    },
    Rule {
        name: "address_street_suffix",
        surface: Surface::Text,
        pattern: &ADDRESS_STREET_RE,
        transform: |caps| Some(markup::collapse_whitespace(&caps[0])),
        accept: plausible_address,
    },
];

/// Ranked rules for coordinates; out-of-range pairs are parsed, then rejected
pub static COORDINATE_RULES: &[Rule<Coordinates>] = &[
    Rule {
        name: "coordinates_data_path",
        surface: Surface::Raw,
        pattern: &COORDS_DATA_PATH_RE,
        transform: parse_pair,
        accept: Coordinates::is_valid,
    },
    Rule {
        name: "coordinates_at_sign",
        surface: Surface::Raw,
        pattern: &COORDS_AT_RE,
        transform: parse_pair,
        accept: Coordinates::is_valid,
    },
    Rule {
        name: "coordinates_json",
        surface: Surface::Raw,
        pattern: &COORDS_JSON_RE,
        transform: parse_pair,
        accept: Coordinates::is_valid,
    },
    Rule {
        name: "coordinates_data_attributes",
        surface: Surface::Raw,
        pattern: &COORDS_DATA_ATTR_RE,
        transform: parse_pair,
        accept: Coordinates::is_valid,
    },
    Rule {
        name: "coordinates_pair",
        surface: Surface::Text,
        pattern: &COORDS_PAIR_RE,
        transform: parse_pair,
        accept: Coordinates::is_valid,
    },
];

/// Ranked rules for the source's opaque place identifier
pub static PLACE_ID_RULES: &[Rule<String>] = &[
    Rule {
        name: "place_id_json",
        surface: Surface::Raw,
        pattern: &PLACE_ID_JSON_RE,
        transform: group1,
        accept: always,
    },
    Rule {
        name: "place_id_chij",
        surface: Surface::Raw,
        pattern: &PLACE_ID_CHIJ_RE,
        transform: group1,
        accept: always,
    },
    Rule {
        name: "place_id_feature",
        surface: Surface::Raw,
        pattern: &PLACE_ID_FEATURE_RE,
        transform: group1,
        accept: always,
    },
    Rule {
        name: "place_id_cid",
        surface: Surface::Raw,
        pattern: &PLACE_ID_CID_RE,
        transform: group1,
        accept: always,
    },
];

pub fn extract_address(window: &ContextWindow<'_>) -> Option<String> {
    first_match(ADDRESS_RULES, window)
}

pub fn extract_coordinates(window: &ContextWindow<'_>) -> Option<Coordinates> {
    first_match(COORDINATE_RULES, window)
}

pub fn extract_place_id(window: &ContextWindow<'_>) -> Option<String> {
    first_match(PLACE_ID_RULES, window)
}

fn clean_address(caps: &Captures<'_>) -> Option<String> {
    let text = markup::collapse_whitespace(&markup::decode_entities(caps.get(1)?.as_str()));
    Some(text.trim_end_matches([',', ';', ' ']).to_string())
}

fn plausible_address(address: &String) -> bool {
    let chars = address.chars().count();
    (MIN_ADDRESS_CHARS..=MAX_ADDRESS_CHARS).contains(&chars)
        && address.chars().any(char::is_alphabetic)
}

fn parse_pair(caps: &Captures<'_>) -> Option<Coordinates> {
    Some(Coordinates {
        latitude: caps.get(1)?.as_str().parse().ok()?,
        longitude: caps.get(2)?.as_str().parse().ok()?,
    })
}
