//! Property tests for validation, deduplication and numeric field ranges

use proptest::prelude::*;

use glean::dedup::name_key;
use glean::fields::{extract_coordinates, extract_rating};
use glean::validate::is_valid_name;
use glean::window::ContextWindow;
use glean::{extract_places, extract_search, ExtractionConfig, PlacesRequest, RawDocument, SearchRequest};

const VOCABULARY: &[&str] = &[
    "Joe's Pizza",
    "Luigi's Trattoria",
    "Katz's Deli",
    "Veselka",
    "Di Fara",
    "Blue Bottle Coffee",
    "Lombardi's",
];

/// Flip the case of each letter whose bit is set in `mask`
fn recase(name: &str, mask: u64) -> String {
    name.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask >> (i % 64) & 1 == 1 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

fn feed(names: &[String]) -> String {
    let articles: String = names
        .iter()
        .map(|name| {
            format!(
                r#"<div role="article" aria-label="{name}"><div class="qBF1Pd">{name}</div></div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div role="feed">{}</div></body></html>"#, articles)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_name_validation_is_deterministic(candidate in "\\PC{0,40}") {
        prop_assert_eq!(is_valid_name(&candidate), is_valid_name(&candidate));
    }

    #[test]
    fn prop_listing_keys_are_unique(picks in prop::collection::vec((0..VOCABULARY.len(), any::<u64>()), 1..12)) {
        let names: Vec<String> = picks
            .iter()
            .map(|(index, mask)| recase(VOCABULARY[*index], *mask))
            .collect();

        let mut distinct: Vec<String> = names.iter().map(|n| name_key(n)).collect();
        distinct.sort();
        distinct.dedup();

        let config = ExtractionConfig::default();
        let request = PlacesRequest { limit: 0, ..Default::default() };
        let page = extract_places(&RawDocument::new(feed(&names)), &request, &config).unwrap();

        let mut keys: Vec<String> = page.records.iter().map(|r| name_key(&r.name)).collect();
        let returned = keys.len();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), returned);
        prop_assert_eq!(keys, distinct);
    }

    #[test]
    fn prop_rating_is_absent_or_in_range(tenths in 0u32..100, count in 1u32..100_000) {
        let text = format!("<span>{}.{} ({})</span>", tenths / 10, tenths % 10, count);
        let window = ContextWindow::from_fragment(&text);
        if let Some(rating) = extract_rating(&window) {
            prop_assert!((1.0..=5.0).contains(&rating));
        }
    }

    #[test]
    fn prop_coordinates_present_only_in_range(lat in -99.0f64..99.0, lng in -199.0f64..199.0) {
        let (lat, lng) = (format!("{:.4}", lat), format!("{:.4}", lng));
        let text = format!("<span>({}, {})</span>", lat, lng);
        let window = ContextWindow::from_fragment(&text);

        let (lat, lng): (f64, f64) = (lat.parse().unwrap(), lng.parse().unwrap());
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        let found = extract_coordinates(&window);
        prop_assert_eq!(found.is_some(), in_range);
        if let Some(coords) = found {
            prop_assert_eq!(coords.latitude, lat);
            prop_assert_eq!(coords.longitude, lng);
        }
    }

    #[test]
    fn prop_organic_positions_are_contiguous(n in 1usize..10) {
        let blocks: String = (1..=n)
            .map(|i| format!(r#"<div class="g"><a href="https://site{i}.example/"><h3>Result number {i}</h3></a></div>"#))
            .collect();
        let config = ExtractionConfig::default();
        let results = extract_search(&RawDocument::new(blocks), &SearchRequest::only(&[]), &config).unwrap();

        let positions: Vec<usize> = results.organic.iter().map(|r| r.position).collect();
        prop_assert_eq!(positions, (1..=n).collect::<Vec<_>>());
        prop_assert_eq!(results.next_cursor, Some(n));
    }
}

#[test]
fn test_banner_text_is_never_a_name() {
    assert!(!is_valid_name("SPONSORED"));
    assert!(!is_valid_name("Open now"));
    assert!(is_valid_name("Joe's Pizza"));
}
