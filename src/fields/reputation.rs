//! Rating and review-count extraction

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{always, first_match, Rule, Surface};
use crate::window::ContextWindow;

static RATING_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""ratingValue"\s*:\s*"?([0-9](?:\.[0-9]+)?)"#).expect("Invalid rating JSON regex")
});

static RATING_ARIA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)aria-label="(?:rated\s+)?([0-9](?:[.,][0-9])?)\s*(?:out of 5\s*)?stars?"#)
        .expect("Invalid rating aria regex")
});

static RATING_STARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([0-9](?:[.,][0-9])?)\s*(?:out of 5\s*)?stars?\b")
        .expect("Invalid rating stars regex")
});

static RATING_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\brat(?:ed|ing)\s*:?\s*([0-9](?:[.,][0-9]{1,2})?)\b")
        .expect("Invalid rating label regex")
});

/// `4.5 (1,234)` - a rating directly followed by a parenthesized count
static RATING_COUNT_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([0-9][.,][0-9])\s*\(\s*([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+(?:\.[0-9])?[KkMm]?)\s*\)")
        .expect("Invalid rating pair regex")
});

static REVIEW_COUNT_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:reviewCount|ratingCount|userRatingCount)"\s*:\s*"?([0-9]+)"#)
        .expect("Invalid review count JSON regex")
});

static REVIEW_COUNT_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+(?:\.[0-9])?[KkMm]?)\s*(?:google\s+)?reviews?\b",
    )
    .expect("Invalid review count regex")
});

/// Ranked rules for the star rating
pub static RATING_RULES: &[Rule<f32>] = &[
    Rule {
        name: "rating_json",
        surface: Surface::Raw,
        pattern: &RATING_JSON_RE,
        transform: parse_rating,
        accept: plausible_rating,
    },
    Rule {
        name: "rating_aria_label",
        surface: Surface::Raw,
        pattern: &RATING_ARIA_RE,
        transform: parse_rating,
        accept: plausible_rating,
    },
    Rule {
        name: "rating_count_pair",
        surface: Surface::Text,
        pattern: &RATING_COUNT_PAIR_RE,
        transform: parse_rating,
        accept: plausible_rating,
    },
    Rule {
        name: "rating_stars",
        surface: Surface::Text,
        pattern: &RATING_STARS_RE,
        transform: parse_rating,
        accept: plausible_rating,
    },
    Rule {
        name: "rating_label",
        surface: Surface::Text,
        pattern: &RATING_LABEL_RE,
        transform: parse_rating,
        accept: plausible_rating,
    },
];

/// Ranked rules for the number of reviews
pub static REVIEW_COUNT_RULES: &[Rule<u32>] = &[
    Rule {
        name: "review_count_json",
        surface: Surface::Raw,
        pattern: &REVIEW_COUNT_JSON_RE,
        transform: |caps| parse_count(&caps[1]),
        accept: always,
    },
    Rule {
        name: "review_count_pair",
        surface: Surface::Text,
        pattern: &RATING_COUNT_PAIR_RE,
        transform: |caps| parse_count(&caps[2]),
        accept: always,
    },
    Rule {
        name: "review_count_text",
        surface: Surface::Text,
        pattern: &REVIEW_COUNT_TEXT_RE,
        transform: |caps| parse_count(&caps[1]),
        accept: always,
    },
];

pub fn extract_rating(window: &ContextWindow<'_>) -> Option<f32> {
    first_match(RATING_RULES, window)
}

pub fn extract_review_count(window: &ContextWindow<'_>) -> Option<u32> {
    first_match(REVIEW_COUNT_RULES, window)
}

fn parse_rating(caps: &Captures<'_>) -> Option<f32> {
    caps.get(1)?.as_str().replace(',', ".").parse().ok()
}

fn plausible_rating(rating: &f32) -> bool {
    (1.0..=5.0).contains(rating)
}

/// Parse `1,234`, `87`, `1.2K` or `3M` into a count
pub fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last()? {
        'k' | 'K' => (&raw[..raw.len() - 1], 1_000.0),
        'm' | 'M' => (&raw[..raw.len() - 1], 1_000_000.0),
        _ => (raw, 1.0),
    };

    if multiplier > 1.0 {
        let value: f64 = digits.parse().ok()?;
        let count = (value * multiplier).round();
        return (count <= u32::MAX as f64).then_some(count as u32);
    }
    digits.replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(html: &str) -> ContextWindow<'_> {
        ContextWindow::from_fragment(html)
    }

    #[test]
    fn test_rating_from_aria_label() {
        let w = window(r#"<span role="img" aria-label="Rated 4.3 out of 5 stars"></span>"#);
        assert_eq!(extract_rating(&w), Some(4.3));
    }

    #[test]
    fn test_rating_from_count_pair() {
        let w = window("<span>4.6</span><span>(1,204)</span>");
        assert_eq!(extract_rating(&w), Some(4.6));
        assert_eq!(extract_review_count(&w), Some(1204));
    }

    #[test]
    fn test_rating_prefers_structured_data() {
        let w = window(r#"<script type="application/ld+json">{"ratingValue": "4.8"}</script><p>3.9 stars</p>"#);
        assert_eq!(extract_rating(&w), Some(4.8));
    }

    #[test]
    fn test_rating_rejects_out_of_range() {
        assert_eq!(extract_rating(&window("<p>Rating: 7.5</p>")), None);
        assert_eq!(extract_rating(&window("<p>0 stars</p>")), None);
        // implausible first match does not block a later plausible one
        assert_eq!(extract_rating(&window("<p>Rating: 9.0 then 4.1 stars</p>")), Some(4.1));
    }

    #[test]
    fn test_rating_ignores_bare_numbers() {
        assert_eq!(extract_rating(&window("<p>Open until 4.30 today</p>")), None);
    }

    #[test]
    fn test_review_count_forms() {
        assert_eq!(extract_review_count(&window("<p>87 reviews</p>")), Some(87));
        assert_eq!(extract_review_count(&window("<p>2,310 Google reviews</p>")), Some(2310));
        assert_eq!(extract_review_count(&window("<p>4.4 (1.2K)</p>")), Some(1200));
        assert_eq!(
            extract_review_count(&window(r#"<script>{"reviewCount": 512}</script>"#)),
            Some(512)
        );
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("3K"), Some(3000));
        assert_eq!(parse_count("2.5m"), Some(2_500_000));
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count(""), None);
    }
}
