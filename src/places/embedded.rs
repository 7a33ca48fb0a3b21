//! Listings inside the page's embedded application state
//!
//! Map result pages ship their data as nested JavaScript arrays. Nothing in
//! them is keyed, but a place identifier sitting next to a quoted string is
//! reliably the place and its name.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::assemble::Anchor;
use crate::document::Document;
use crate::error::Result;
use crate::fields::PartialFields;
use crate::strategy::Strategy;

/// `"0x89c2598f…:0x1d2c…","Joe's Pizza"` (feature id, then name)
static FEATURE_ID_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(0x[0-9a-f]{6,16}:0x[0-9a-f]{6,16})"\s*,\s*"((?:[^"\\]|\\.){2,120})""#)
        .expect("Invalid feature id regex")
});

/// `"ChIJ…","Joe's Pizza"` or `"Joe's Pizza","ChIJ…"`
static CHIJ_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#""(ChIJ[A-Za-z0-9_-]{16,})"\s*,\s*"((?:[^"\\]|\\.){2,120})""#,
        r#"|"((?:[^"\\]|\\.){2,120})"\s*,\s*"(ChIJ[A-Za-z0-9_-]{16,})""#,
    ))
    .expect("Invalid place id regex")
});

/// Keyed state objects: a name followed closely by its place id
static KEYED_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:name|title)"\s*:\s*"((?:[^"\\]|\\.){2,120})"[^{}]{0,400}?"(?:place_id|placeId)"\s*:\s*"([^"]{6,})""#)
        .expect("Invalid keyed state regex")
});

static JS_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\\(?:u([0-9a-fA-F]{4})|x([0-9a-fA-F]{2})|(["\\/'nrt]))"#).expect("Invalid escape regex")
});

pub struct EmbeddedState;

impl Strategy for EmbeddedState {
    type Output = Anchor;

    fn name(&self) -> &'static str {
        "embedded_state"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<Anchor>> {
        let raw = doc.raw();
        let mut found: Vec<(usize, String, String)> = Vec::new();

        for caps in FEATURE_ID_NAME_RE.captures_iter(raw) {
            found.push((offset_of(&caps), caps[2].to_string(), caps[1].to_string()));
        }
        for caps in CHIJ_NAME_RE.captures_iter(raw) {
            let (id, name) = match (caps.get(1), caps.get(2)) {
                (Some(id), Some(name)) => (id.as_str(), name.as_str()),
                _ => match (caps.get(4), caps.get(3)) {
                    (Some(id), Some(name)) => (id.as_str(), name.as_str()),
                    _ => continue,
                },
            };
            found.push((offset_of(&caps), name.to_string(), id.to_string()));
        }
        for caps in KEYED_STATE_RE.captures_iter(raw) {
            found.push((offset_of(&caps), caps[1].to_string(), caps[2].to_string()));
        }

        found.sort_by_key(|(offset, _, _)| *offset);
        let anchors = found
            .into_iter()
            .map(|(offset, name, place_id)| {
                Anchor::new(&unescape_js(&name), offset, self.name()).with_partial(PartialFields {
                    place_id: Some(place_id),
                    ..Default::default()
                })
            })
            .collect();
        Ok(anchors)
    }
}

fn offset_of(caps: &Captures<'_>) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or(0)
}

/// Undo JavaScript string escapes (`\u0026`, `\x27`, `\"`)
fn unescape_js(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }
    JS_ESCAPE_RE
        .replace_all(s, |caps: &Captures<'_>| {
            if let Some(hex) = caps.get(1).or_else(|| caps.get(2)) {
                return u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default();
            }
            match &caps[3] {
                "n" | "r" | "t" => " ".to_string(),
                other => other.to_string(),
            }
        })
        .into_owned()
}
