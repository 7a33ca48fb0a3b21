//! Business listings from a local-search or maps results document

mod classed;
mod embedded;
mod loose;
mod place_links;
mod structured;

use crate::assemble::{Anchor, Assembler};
use crate::config::ExtractionConfig;
use crate::document::{Document, RawDocument};
use crate::error::Result;
use crate::fields::Enrichment;
use crate::records::BusinessRecord;
use crate::strategy::{Page, StrategyChain};

pub use classed::ClassedMarkup;
pub use embedded::EmbeddedState;
pub use loose::LooseText;
pub use place_links::PlaceLinks;
pub use structured::JsonLdListings;

/// Limit used when a request does not set one
pub const DEFAULT_LIMIT: usize = 20;

/// Parameters for one listings extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacesRequest {
    /// Stop once this many records exist; 0 means no limit
    pub limit: usize,
    /// Offset of this document within the caller's overall result set
    pub cursor: usize,
    /// Which optional fields to look for
    pub enrich: Enrichment,
}

impl Default for PlacesRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cursor: 0,
            enrich: Enrichment::default(),
        }
    }
}

impl PlacesRequest {
    /// A request using the configured default limit
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            limit: config.default_limit,
            ..Default::default()
        }
    }
}

/// Listing strategies, most structured first
pub fn places_chain() -> StrategyChain<'static, Anchor> {
    StrategyChain::new("places")
        .with(JsonLdListings)
        .with(EmbeddedState)
        .with(ClassedMarkup)
        .with(PlaceLinks)
        .with(LooseText)
}

/// Extract business listings from one document.
///
/// Fails only on a challenge page. An empty document, or one where no
/// strategy finds anything, gives an empty page.
pub fn extract_places(
    raw: &RawDocument,
    request: &PlacesRequest,
    config: &ExtractionConfig,
) -> Result<Page<BusinessRecord>> {
    if !raw.ensure_extractable(config)? {
        return Ok(Page::empty());
    }

    let doc = Document::new(raw, config);
    let assembler = Assembler::new(doc.raw(), config, request.enrich);
    let result = places_chain().run(&doc, request.limit, |anchor, neighbours| {
        assembler.assemble(anchor, neighbours)
    });

    tracing::debug!(
        records = result.records.len(),
        exhausted = result.exhausted,
        cursor = request.cursor,
        "places extraction finished"
    );
    Ok(Page::from_result(result, request.cursor))
}
