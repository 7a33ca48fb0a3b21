//! Paid results

use once_cell::sync::Lazy;
use regex::Regex;

use super::{first_link_in, first_text_in};
use crate::dedup::url_key;
use crate::document::Document;
use crate::error::Result;
use crate::links::{display_url, UrlResolver};
use crate::markup;
use crate::records::AdResult;
use crate::strategy::{Candidate, Strategy, StrategyChain};
use crate::validate::is_valid_title;

const AD_BLOCKS: &str = "[data-text-ad], .uEierd";

const TITLE_SELECTORS: &[&str] = &[r#"[role="heading"]"#, ".CCgQ5", "h3"];
const DISPLAY_SELECTORS: &[&str] = &[".x2VHCd", ".qzEoUe", "cite"];
const DESCRIPTION_SELECTORS: &[&str] = &[".MUxGbd", ".yDYNvb", ".Va3FIb"];

/// Marker that opens the organic results column
const ORGANIC_MARKER: &str = r#"id="rso""#;

static AD_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<a\s[^>]*?href="([^"]*(?:/aclk\?|googleadservices\.com/pagead/aclk)[^"]*)"[^>]*>(.*?)</a>"#,
    )
    .expect("Invalid ad link regex")
});

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)role="heading"[^>]*>(.*?)</(?:div|span)>"#).expect("Invalid heading regex")
});

impl Candidate for AdResult {
    fn dedup_key(&self) -> String {
        url_key(&self.url)
    }

    fn is_valid(&self) -> bool {
        !self.url.is_empty() && is_valid_title(&self.title)
    }
}

/// Ad strategies, most structured first
pub fn ads_chain() -> StrategyChain<'static, AdResult> {
    StrategyChain::new("ads").with(AdBlocks).with(AdClickLinks)
}

/// Whether an ad at `offset` sits above the organic results.
///
/// Uses the organic column marker when present, otherwise the first half
/// of the document counts as top.
fn is_top(raw: &str, offset: usize) -> bool {
    match raw.find(ORGANIC_MARKER) {
        Some(organic) => offset < organic,
        None => offset < raw.len() / 2,
    }
}

/// Classed ad containers
pub struct AdBlocks;

impl Strategy for AdBlocks {
    type Output = AdResult;

    fn name(&self) -> &'static str {
        "ad_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<AdResult>> {
        let resolver = UrlResolver::new(doc.config());
        let mut ads = Vec::new();
        let mut from = 0;

        for block in doc.select(AD_BLOCKS)? {
            let Some(url) = first_link_in(block, &resolver)? else {
                continue;
            };
            let Some(title) = first_text_in(block, TITLE_SELECTORS)? else {
                continue;
            };
            let offset = doc.locate(&title, from).unwrap_or(from);
            from = offset + 1;

            ads.push(AdResult {
                position: 0,
                display_url: first_text_in(block, DISPLAY_SELECTORS)?
                    .unwrap_or_else(|| display_url(&url)),
                description: first_text_in(block, DESCRIPTION_SELECTORS)?.unwrap_or_default(),
                is_top: is_top(doc.raw(), offset),
                title,
                url,
            });
        }
        Ok(ads)
    }
}

/// Ad click-through links in the raw markup
pub struct AdClickLinks;

impl Strategy for AdClickLinks {
    type Output = AdResult;

    fn name(&self) -> &'static str {
        "ad_click_links"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<AdResult>> {
        let resolver = UrlResolver::new(doc.config());
        let mut ads = Vec::new();

        for caps in AD_LINK_RE.captures_iter(doc.raw()) {
            let Some(url) = resolver.resolve(&caps[1]) else {
                continue;
            };
            let inner = &caps[2];
            let title = HEADING_RE
                .captures(inner)
                .map(|h| markup::strip_tags(&h[1]))
                .unwrap_or_else(|| markup::strip_tags(inner));
            let offset = caps.get(0).map(|m| m.start()).unwrap_or(0);

            ads.push(AdResult {
                position: 0,
                title,
                display_url: display_url(&url),
                url,
                description: String::new(),
                is_top: is_top(doc.raw(), offset),
            });
        }
        Ok(ads)
    }
}
