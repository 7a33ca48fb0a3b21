//! Related search queries

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dedup::name_key;
use crate::document::Document;
use crate::error::Result;
use crate::markup;
use crate::records::RelatedQuery;
use crate::strategy::{Candidate, Strategy, StrategyChain};
use crate::validate::is_valid_query;

const QUERY_BLOCKS: &str = "a.k8XOCe, .s75CSd, .dg6jd";

const MARKERS: &[&str] = &["Related searches", "People also search for"];

static SEARCH_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href="([^"]*/search\?[^"]*)"[^>]*>(.*?)</a>"#)
        .expect("Invalid search link regex")
});

impl Candidate for RelatedQuery {
    fn dedup_key(&self) -> String {
        name_key(self)
    }

    fn is_valid(&self) -> bool {
        is_valid_query(self)
    }
}

/// Related query strategies, most structured first
pub fn related_chain() -> StrategyChain<'static, RelatedQuery> {
    StrategyChain::new("related")
        .with(QueryBlocks)
        .with(SearchLinks)
}

/// Classed query chips
pub struct QueryBlocks;

impl Strategy for QueryBlocks {
    type Output = RelatedQuery;

    fn name(&self) -> &'static str {
        "query_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<RelatedQuery>> {
        Ok(doc
            .select(QUERY_BLOCKS)?
            .iter()
            .map(markup::element_text)
            .filter(|q| !q.is_empty())
            .collect())
    }
}

/// Search links after the related-searches heading
pub struct SearchLinks;

impl Strategy for SearchLinks {
    type Output = RelatedQuery;

    fn name(&self) -> &'static str {
        "search_links"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<RelatedQuery>> {
        let Some(marker) = MARKERS.iter().find_map(|m| doc.find_marker(m)) else {
            return Ok(Vec::new());
        };

        let mut queries = Vec::new();
        for caps in SEARCH_LINK_RE.captures_iter(&doc.raw()[marker..]) {
            let href = caps[1].replace("&amp;", "&");
            // vertical tabs (images, news) are navigation
            if href.contains("tbm=") || href.contains("udm=") {
                continue;
            }
            let text = markup::strip_tags(&caps[2]);
            let query = if text.is_empty() { query_param(&href) } else { Some(text) };
            queries.extend(query);
        }
        Ok(queries)
    }
}

/// The decoded `q` parameter of a search href
fn query_param(href: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("q="))
        .map(|q| q.replace('+', " "))
        .and_then(|q| urlencoding::decode(&q).ok().map(|d| d.into_owned()))
}
