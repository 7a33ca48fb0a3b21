//! Local listings embedded in search results (the map pack)
//!
//! Field values come from the same extractors the listings pipeline uses,
//! scoped to one entry's markup instead of a fixed window.

use scraper::ElementRef;

use super::{closest, first_text_in};
use crate::dedup::name_key;
use crate::document::Document;
use crate::error::Result;
use crate::fields::{
    extract_address, extract_categories, extract_phone, extract_rating, extract_review_count,
};
use crate::markup;
use crate::records::MapPackEntry;
use crate::strategy::{Candidate, Strategy, StrategyChain};
use crate::validate::is_valid_name;
use crate::window::ContextWindow;

const PACK_BLOCKS: &str = ".VkpGBb, [data-cid], .rllt__details";

const NAME_SELECTORS: &[&str] = &[".dbg0pd", ".OSrXXb", r#"[role="heading"]"#, ".qBF1Pd"];

const PACK_LINKS: &str = r#"a[href*="ludocid="], a[href*="lrd="]"#;

impl Candidate for MapPackEntry {
    fn dedup_key(&self) -> String {
        name_key(&self.name)
    }

    fn is_valid(&self) -> bool {
        is_valid_name(&self.name)
    }
}

/// Map pack strategies, most structured first
pub fn map_pack_chain() -> StrategyChain<'static, MapPackEntry> {
    StrategyChain::new("map_pack")
        .with(PackBlocks)
        .with(PackLinks)
}

/// Fill an entry's fields from the markup of its own block
fn entry_from(name: String, scope: ElementRef<'_>) -> MapPackEntry {
    let html = scope.html();
    let window = ContextWindow::from_fragment(&html);
    MapPackEntry {
        address: extract_address(&window),
        rating: extract_rating(&window),
        review_count: extract_review_count(&window),
        category: extract_categories(&window, &name).into_iter().next(),
        phone: extract_phone(&window),
        name,
    }
}

/// Classed entry containers
pub struct PackBlocks;

impl Strategy for PackBlocks {
    type Output = MapPackEntry;

    fn name(&self) -> &'static str {
        "pack_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<MapPackEntry>> {
        let mut entries = Vec::new();
        for block in doc.select(PACK_BLOCKS)? {
            if let Some(name) = first_text_in(block, NAME_SELECTORS)? {
                entries.push(entry_from(name, block));
            }
        }
        Ok(entries)
    }
}

/// Links into a listing's detail view, scoped to their enclosing block
pub struct PackLinks;

impl Strategy for PackLinks {
    type Output = MapPackEntry;

    fn name(&self) -> &'static str {
        "pack_links"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<MapPackEntry>> {
        let mut entries = Vec::new();
        for link in doc.select(PACK_LINKS)? {
            let name = match link.value().attr("aria-label") {
                Some(label) if !label.trim().is_empty() => markup::collapse_whitespace(label),
                _ => markup::element_text(&link),
            };
            if name.is_empty() {
                continue;
            }
            // the nearest div holding the link is the entry's block
            let scope = link
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|parent| closest(parent, |el| el.value().name() == "div"))
                .unwrap_or(link);
            entries.push(entry_from(name, scope));
        }
        Ok(entries)
    }
}
