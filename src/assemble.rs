//! Record assembly - turn a surviving anchor into a business record
//!
//! Fields a strategy already knows (from embedded JSON, say) win over fields
//! scraped from the context window; the window only fills the gaps.

use crate::config::ExtractionConfig;
use crate::dedup::{name_key, Deduplicator};
use crate::fields::{self, Enrichment, PartialFields};
use crate::links::UrlResolver;
use crate::markup;
use crate::records::BusinessRecord;
use crate::strategy::Candidate;
use crate::validate::{is_valid_category, is_valid_name};
use crate::window::{window_between, Neighbours};

const MAX_CATEGORIES: usize = 5;

/// A located prospective entity name
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    /// Byte offset of the name (or its source block) in the raw document
    pub offset: usize,
    /// Fields the producing strategy already knows
    pub partial: PartialFields,
    /// Which strategy produced the anchor
    pub strategy: &'static str,
}

impl Anchor {
    pub fn new(name: &str, offset: usize, strategy: &'static str) -> Self {
        Self {
            name: markup::collapse_whitespace(&markup::decode_entities(name)),
            offset,
            partial: PartialFields::default(),
            strategy,
        }
    }

    pub fn with_partial(mut self, partial: PartialFields) -> Self {
        self.partial = partial;
        self
    }
}

impl Candidate for Anchor {
    fn dedup_key(&self) -> String {
        name_key(&self.name)
    }

    fn is_valid(&self) -> bool {
        is_valid_name(&self.name)
    }

    fn offset(&self) -> Option<usize> {
        Some(self.offset)
    }
}

/// Enriches anchors from one document into records
pub struct Assembler<'a> {
    document: &'a str,
    config: &'a ExtractionConfig,
    enrichment: Enrichment,
    resolver: UrlResolver<'a>,
}

impl<'a> Assembler<'a> {
    pub fn new(document: &'a str, config: &'a ExtractionConfig, enrichment: Enrichment) -> Self {
        Self {
            document,
            config,
            enrichment,
            resolver: UrlResolver::new(config),
        }
    }

    pub fn assemble(&self, anchor: Anchor, neighbours: Neighbours) -> BusinessRecord {
        let window = window_between(self.document, anchor.offset, neighbours, self.config);
        let found = fields::enrich(&window, &anchor.name, &self.enrichment, &self.resolver);
        tracing::trace!(
            name = %anchor.name,
            strategy = anchor.strategy,
            window_start = window.start,
            window_len = window.raw.len(),
            "assembling record"
        );
        merge(anchor, found, &self.enrichment, &self.resolver)
    }
}

/// Known fields first, window fields for the rest, disabled enrichment off
fn merge(
    anchor: Anchor,
    found: PartialFields,
    enrichment: &Enrichment,
    resolver: &UrlResolver<'_>,
) -> BusinessRecord {
    let Anchor { name, partial, .. } = anchor;

    let website = partial
        .website
        .and_then(|url| resolver.resolve(&url))
        .or(found.website);
    let rating = partial
        .rating
        .filter(|r| (1.0..=5.0).contains(r))
        .or(found.rating);
    let coordinates = partial
        .coordinates
        .filter(|c| c.is_valid())
        .or(found.coordinates);
    let categories = merge_categories(&name, partial.categories, found.categories);

    BusinessRecord {
        address: partial.address.or(found.address),
        phone: partial.phone.or(found.phone),
        website: website.filter(|_| enrichment.contact),
        email: partial.email.or(found.email).filter(|_| enrichment.contact),
        hours: partial
            .hours
            .filter(|h| !h.is_empty())
            .or(found.hours)
            .filter(|_| enrichment.hours),
        rating,
        review_count: partial.review_count.or(found.review_count),
        categories: if enrichment.categories {
            categories
        } else {
            Vec::new()
        },
        coordinates: coordinates.filter(|_| enrichment.coordinates),
        place_id: partial.place_id.or(found.place_id),
        price_level: partial.price_level.or(found.price_level),
        permanently_closed: partial.permanently_closed || found.permanently_closed,
        name,
    }
}

fn merge_categories(name: &str, known: Vec<String>, found: Vec<String>) -> Vec<String> {
    let mut seen = Deduplicator::new();
    seen.add(&name_key(name));
    known
        .into_iter()
        .chain(found)
        .map(|c| markup::collapse_whitespace(&c))
        .filter(|c| is_valid_category(c) && seen.add(&name_key(c)))
        .take(MAX_CATEGORIES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Coordinates;
    use pretty_assertions::assert_eq;

    const LISTING: &str = r#"
        <div class="listing">
            <h3>Joe's Pizza</h3>
            <span>4.5 (1,204)</span> · <span>Pizza restaurant</span>
            <span>7 Carmine St, New York, NY 10014</span>
            <a href="tel:+12125550100">Call</a>
            <a href="https://joespizza.example/">Website</a>
        </div>
        <div class="listing">
            <h3>Luigi's</h3>
            <a href="tel:+12125550199">Call</a>
        </div>
    "#;

    #[test]
    fn test_assemble_enriches_from_window() {
        let config = ExtractionConfig::default();
        let assembler = Assembler::new(LISTING, &config, Enrichment::default());
        let offset = LISTING.find("Joe's Pizza").unwrap();
        let next = LISTING.find("Luigi's");

        let record = assembler.assemble(
            Anchor::new("Joe's Pizza", offset, "test"),
            Neighbours::new(None, next),
        );
        assert_eq!(record.name, "Joe's Pizza");
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.review_count, Some(1204));
        assert_eq!(record.phone.as_deref(), Some("+12125550100"));
        assert_eq!(record.address.as_deref(), Some("7 Carmine St, New York, NY 10014"));
        assert_eq!(record.website.as_deref(), Some("https://joespizza.example/"));
        assert_eq!(record.categories, vec!["Pizza restaurant".to_string()]);
        assert!(!record.permanently_closed);
    }

    #[test]
    fn test_known_fields_win() {
        let config = ExtractionConfig::default();
        let assembler = Assembler::new(LISTING, &config, Enrichment::default());
        let offset = LISTING.find("Joe's Pizza").unwrap();
        let anchor = Anchor::new("Joe's Pizza", offset, "test").with_partial(PartialFields {
            phone: Some("+1 212-555-0000".into()),
            rating: Some(4.9),
            ..Default::default()
        });

        let record = assembler.assemble(anchor, Neighbours::default());
        assert_eq!(record.phone.as_deref(), Some("+1 212-555-0000"));
        assert_eq!(record.rating, Some(4.9));
        assert_eq!(record.review_count, Some(1204));
    }

    #[test]
    fn test_implausible_known_values_are_replaced() {
        let config = ExtractionConfig::default();
        let assembler = Assembler::new(LISTING, &config, Enrichment::default());
        let anchor = Anchor::new("Joe's Pizza", 0, "test").with_partial(PartialFields {
            rating: Some(9.5),
            coordinates: Some(Coordinates {
                latitude: 95.0,
                longitude: 40.0,
            }),
            ..Default::default()
        });

        let record = assembler.assemble(anchor, Neighbours::new(None, LISTING.find("Luigi's")));
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.coordinates, None);
    }

    #[test]
    fn test_disabled_enrichment_clears_fields() {
        let config = ExtractionConfig::default();
        let enrichment = Enrichment {
            contact: false,
            categories: false,
            ..Default::default()
        };
        let assembler = Assembler::new(LISTING, &config, enrichment);
        let anchor = Anchor::new("Joe's Pizza", 0, "test").with_partial(PartialFields {
            website: Some("https://joespizza.example/".into()),
            categories: vec!["Pizza".into()],
            ..Default::default()
        });

        let record = assembler.assemble(anchor, Neighbours::default());
        assert_eq!(record.website, None);
        assert!(record.categories.is_empty());
    }

    #[test]
    fn test_neighbour_fields_stay_out() {
        let config = ExtractionConfig::default();
        let assembler = Assembler::new(LISTING, &config, Enrichment::default());
        let previous = LISTING.find("Joe's Pizza");
        let offset = LISTING.find("Luigi's").unwrap();

        let record = assembler.assemble(
            Anchor::new("Luigi's", offset, "test"),
            Neighbours::new(previous, None),
        );
        assert_eq!(record.phone.as_deref(), Some("+12125550199"));
        assert_eq!(record.rating, None);
        assert_eq!(record.review_count, None);
        assert!(record.categories.is_empty());
    }

    #[test]
    fn test_anchor_candidate_contract() {
        let anchor = Anchor::new("  JOE&#39;S   PIZZA ", 3, "test");
        assert_eq!(anchor.name, "JOE'S PIZZA");
        assert_eq!(anchor.dedup_key(), "joe's pizza");
        assert!(anchor.is_valid());
        assert!(!Anchor::new("SPONSORED", 0, "test").is_valid());
    }
}
