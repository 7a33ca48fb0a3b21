//! Listings recovered from map place links

use once_cell::sync::Lazy;
use regex::Regex;

use crate::assemble::Anchor;
use crate::document::Document;
use crate::error::Result;
use crate::fields::PartialFields;
use crate::records::Coordinates;
use crate::strategy::Strategy;

static PLACE_HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="([^"]*/maps/place/([^/"?]+)[^"]*)""#).expect("Invalid place href regex")
});

static DATA_PLACE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!1s(0x[0-9a-f]+:0x[0-9a-f]+|ChIJ[A-Za-z0-9_-]+)").expect("Invalid data place id regex")
});

static DATA_COORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!3d(-?[0-9]+\.[0-9]+)!4d(-?[0-9]+\.[0-9]+)").expect("Invalid data coords regex")
});

pub struct PlaceLinks;

impl Strategy for PlaceLinks {
    type Output = Anchor;

    fn name(&self) -> &'static str {
        "place_links"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<Anchor>> {
        let mut anchors = Vec::new();

        for caps in PLACE_HREF_RE.captures_iter(doc.raw()) {
            let href = caps[1].replace("&amp;", "&");
            let Some(name) = decode_segment(&caps[2]) else {
                continue;
            };
            let offset = caps.get(0).map(|m| m.start()).unwrap_or(0);

            let partial = PartialFields {
                place_id: DATA_PLACE_ID_RE.captures(&href).map(|c| c[1].to_string()),
                coordinates: DATA_COORDS_RE.captures(&href).and_then(|c| {
                    Coordinates::new(c[1].parse().ok()?, c[2].parse().ok()?)
                }),
                ..Default::default()
            };
            anchors.push(Anchor::new(&name, offset, self.name()).with_partial(partial));
        }
        Ok(anchors)
    }
}

/// `Joe's+Pizza` / `Caf%C3%A9+Lalo` -> display name
fn decode_segment(segment: &str) -> Option<String> {
    let spaced = segment.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            tracing::trace!(%segment, error = %e, "undecodable place segment");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    #[test]
    fn test_place_links_decode_names_and_ids() {
        let html = r#"
            <a href="https://www.google.com/maps/place/Caf%C3%A9+Lalo/@40.78,-73.98,17z/data=!3m1!4b1!4m6!3m5!1s0x89c2588b:0x5a1b!8m2!3d40.7835!4d-73.9801">x</a>
            <a href="/maps/place/Joe's+Pizza/">y</a>
        "#;
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        let anchors = PlaceLinks.attempt(&doc).unwrap();

        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].name, "Café Lalo");
        assert_eq!(anchors[0].partial.place_id.as_deref(), Some("0x89c2588b:0x5a1b"));
        assert_eq!(
            anchors[0].partial.coordinates,
            Some(Coordinates {
                latitude: 40.7835,
                longitude: -73.9801
            })
        );
        assert_eq!(anchors[1].name, "Joe's Pizza");
        assert_eq!(anchors[1].partial.place_id, None);
    }

    #[test]
    fn test_decode_segment_rejects_bad_utf8() {
        assert_eq!(decode_segment("%FF%FE"), None);
        assert_eq!(decode_segment("A+B").as_deref(), Some("A B"));
    }
}
