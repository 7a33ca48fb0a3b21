//! Field extractors - ranked heuristic rules per semantic field
//!
//! No class name or layout is stable enough to trust on its own, so every
//! field carries an ordered table of [`Rule`]s. A rule is a pattern, a
//! transform that turns a match into a value, and a plausibility check on that
//! value. Rules run in table order and every match of a rule is tried before
//! the next rule; the first value that survives its check wins.
//!
//! A transform that fails (an unparsable number, say) only costs that one
//! match. Nothing here returns an error.

mod contact;
mod listing;
mod location;
mod reputation;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::links::UrlResolver;
use crate::records::{Coordinates, Hours};
use crate::window::ContextWindow;

pub use contact::{extract_email, extract_phone, extract_website, EMAIL_RULES, PHONE_RULES, WEBSITE_RULES};
pub use listing::{
    extract_categories, extract_hours, extract_permanently_closed, extract_price_level,
    CATEGORY_RULES, CLOSED_RULES, HOURS_RULES, PRICE_RULES,
};
pub use location::{
    extract_address, extract_coordinates, extract_place_id, ADDRESS_RULES, COORDINATE_RULES,
    PLACE_ID_RULES,
};
pub use reputation::{extract_rating, extract_review_count, RATING_RULES, REVIEW_COUNT_RULES};

/// Which view of the context window a rule scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Raw markup: attributes, hrefs, embedded JSON
    Raw,
    /// Visible text
    Text,
}

/// One ranked heuristic for one field
pub struct Rule<T: 'static> {
    /// Short identifier, used in logs and tests
    pub name: &'static str,
    pub surface: Surface,
    pub pattern: &'static Lazy<Regex>,
    /// Turn a match into a value; `None` is a swallowed parse failure
    pub transform: fn(&Captures<'_>) -> Option<T>,
    /// Field-specific plausibility check
    pub accept: fn(&T) -> bool,
}

impl<T> Rule<T> {
    /// Every accepted value this rule yields over a window, in match order
    pub fn matches<'w>(&'w self, window: &'w ContextWindow<'_>) -> impl Iterator<Item = T> + 'w {
        let haystack = match self.surface {
            Surface::Raw => window.raw,
            Surface::Text => window.text.as_str(),
        };
        self.pattern.captures_iter(haystack).filter_map(move |caps| {
            let Some(value) = (self.transform)(&caps) else {
                tracing::trace!(rule = self.name, matched = &caps[0], "field parse failed");
                return None;
            };
            if (self.accept)(&value) {
                Some(value)
            } else {
                tracing::trace!(rule = self.name, matched = &caps[0], "implausible value rejected");
                None
            }
        })
    }
}

/// Lazily walk a rule table, yielding accepted values in rank order
pub fn candidates<'w, T>(
    rules: &'w [Rule<T>],
    window: &'w ContextWindow<'_>,
) -> impl Iterator<Item = T> + 'w {
    rules.iter().flat_map(move |rule| rule.matches(window))
}

/// First accepted value of a rule table
pub fn first_match<T>(rules: &[Rule<T>], window: &ContextWindow<'_>) -> Option<T> {
    candidates(rules, window).next()
}

/// Capture group 1 as a trimmed string
pub(crate) fn group1(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().trim().to_string())
}

/// The whole match as a trimmed string
pub(crate) fn whole(caps: &Captures<'_>) -> Option<String> {
    caps.get(0).map(|m| m.as_str().trim().to_string())
}

pub(crate) fn always<T>(_: &T) -> bool {
    true
}

/// Which optional enrichment to attempt for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enrichment {
    pub hours: bool,
    /// Website and email
    pub contact: bool,
    pub coordinates: bool,
    pub categories: bool,
}

impl Default for Enrichment {
    fn default() -> Self {
        Self {
            hours: true,
            contact: true,
            coordinates: true,
            categories: true,
        }
    }
}

/// Optional business fields, as known so far for one anchor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFields {
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub hours: Option<Hours>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub categories: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub place_id: Option<String>,
    pub price_level: Option<String>,
    pub permanently_closed: bool,
}

/// Run every enabled field extractor over one anchor's window
pub fn enrich(
    window: &ContextWindow<'_>,
    name: &str,
    enrichment: &Enrichment,
    resolver: &UrlResolver<'_>,
) -> PartialFields {
    let mut fields = PartialFields {
        address: extract_address(window),
        phone: extract_phone(window),
        rating: extract_rating(window),
        review_count: extract_review_count(window),
        place_id: extract_place_id(window),
        price_level: extract_price_level(window),
        permanently_closed: extract_permanently_closed(window),
        ..Default::default()
    };

    if enrichment.contact {
        fields.website = extract_website(window, resolver);
        fields.email = extract_email(window, resolver);
    }
    if enrichment.hours {
        fields.hours = extract_hours(window);
    }
    if enrichment.coordinates {
        fields.coordinates = extract_coordinates(window);
    }
    if enrichment.categories {
        fields.categories = extract_categories(window, name);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("digits"));

    static EVEN_RULES: &[Rule<u32>] = &[Rule {
        name: "even",
        surface: Surface::Text,
        pattern: &DIGITS_RE,
        transform: |caps| caps[1].parse().ok(),
        accept: |n| n % 2 == 0,
    }];

    #[test]
    fn test_first_match_skips_implausible_values() {
        let window = ContextWindow::from_fragment("<p>7 then 99999999999 then 12</p>");
        // 7 is odd, the second number overflows u32, 12 passes
        assert_eq!(first_match(EVEN_RULES, &window), Some(12));
    }

    #[test]
    fn test_first_match_none_when_nothing_passes() {
        let window = ContextWindow::from_fragment("<p>1 3 5</p>");
        assert_eq!(first_match(EVEN_RULES, &window), None);
    }

    #[test]
    fn test_enrich_respects_enrichment_flags() {
        let html = r#"
            <div>
                <h3>Joe's Pizza</h3>
                <span>4.6 (1,204)</span> · <span>$$</span> · <span>Pizza restaurant</span>
                <a href="tel:+12125551234">Call</a>
                <a href="https://joespizza.example/">Website</a>
                <span>Monday 10 AM–11 PM</span>
            </div>
        "#;
        let window = ContextWindow::from_fragment(html);
        let config = ExtractionConfig::default();
        let resolver = UrlResolver::new(&config);

        let full = enrich(&window, "Joe's Pizza", &Enrichment::default(), &resolver);
        assert_eq!(full.rating, Some(4.6));
        assert_eq!(full.review_count, Some(1204));
        assert_eq!(full.price_level.as_deref(), Some("$$"));
        assert_eq!(full.website.as_deref(), Some("https://joespizza.example/"));
        assert!(full.hours.is_some());
        assert_eq!(full.categories, vec!["Pizza restaurant".to_string()]);

        let lean = Enrichment {
            hours: false,
            contact: false,
            coordinates: false,
            categories: false,
        };
        let partial = enrich(&window, "Joe's Pizza", &lean, &resolver);
        assert_eq!(partial.rating, Some(4.6));
        assert_eq!(partial.phone.as_deref(), Some("+12125551234"));
        assert!(partial.website.is_none());
        assert!(partial.hours.is_none());
        assert!(partial.categories.is_empty());
    }
}
