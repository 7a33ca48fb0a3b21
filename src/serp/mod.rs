//! Search-result features from a web search results document
//!
//! Every feature is its own strategy chain with its own deduplicator. Organic
//! results always run; the rest run when the request asks for them.

mod ads;
mod featured;
mod info_panel;
mod map_pack;
mod organic;
mod questions;
mod related;
mod summary;

use std::fmt;
use std::str::FromStr;

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::document::{Document, RawDocument};
use crate::error::{GleanError, Result};
use crate::links::UrlResolver;
use crate::markup;
use crate::records::{
    AdResult, FeaturedPassage, InfoPanel, MapPackEntry, OrganicResult, QuestionAnswer,
    RelatedQuery, SummaryPanel,
};
use crate::strategy::next_cursor;
use crate::window::Neighbours;

pub use ads::ads_chain;
pub use featured::featured_chain;
pub use info_panel::info_panel_chain;
pub use map_pack::map_pack_chain;
pub use organic::organic_chain;
pub use questions::questions_chain;
pub use related::related_chain;
pub use summary::summary_chain;

/// An optional search feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFeature {
    Ads,
    Questions,
    Featured,
    Summary,
    MapPack,
    InfoPanel,
    Related,
}

impl SearchFeature {
    pub const ALL: [SearchFeature; 7] = [
        SearchFeature::Ads,
        SearchFeature::Questions,
        SearchFeature::Featured,
        SearchFeature::Summary,
        SearchFeature::MapPack,
        SearchFeature::InfoPanel,
        SearchFeature::Related,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchFeature::Ads => "ads",
            SearchFeature::Questions => "questions",
            SearchFeature::Featured => "featured",
            SearchFeature::Summary => "summary",
            SearchFeature::MapPack => "map_pack",
            SearchFeature::InfoPanel => "info_panel",
            SearchFeature::Related => "related",
        }
    }
}

impl fmt::Display for SearchFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchFeature {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        SearchFeature::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unknown search feature: {}", s))
    }
}

/// Parameters for one search extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Optional features to extract alongside organic results
    pub features: Vec<SearchFeature>,
    /// Offset of this page's first organic result in the caller's result set
    pub cursor: usize,
    /// Organic result target; 0 means no limit
    pub limit: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            features: SearchFeature::ALL.to_vec(),
            cursor: 0,
            limit: 0,
        }
    }
}

impl SearchRequest {
    /// Organic results plus only the given features
    pub fn only(features: &[SearchFeature]) -> Self {
        Self {
            features: features.to_vec(),
            ..Default::default()
        }
    }

    pub fn wants(&self, feature: SearchFeature) -> bool {
        self.features.contains(&feature)
    }
}

/// Everything extracted from one search results document.
///
/// `total_found` and `next_cursor` describe the organic list, which is the
/// paginated one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub organic: Vec<OrganicResult>,
    pub ads: Vec<AdResult>,
    pub questions: Vec<QuestionAnswer>,
    pub featured: Option<FeaturedPassage>,
    pub summary: Option<SummaryPanel>,
    pub map_pack: Vec<MapPackEntry>,
    pub info_panel: Option<InfoPanel>,
    pub related: Vec<RelatedQuery>,
    pub total_found: usize,
    pub next_cursor: Option<usize>,
}

/// Extract search features from one document.
///
/// Fails only on a challenge page; an empty document gives empty results.
pub fn extract_search(
    raw: &RawDocument,
    request: &SearchRequest,
    config: &ExtractionConfig,
) -> Result<SearchResults> {
    if !raw.ensure_extractable(config)? {
        return Ok(SearchResults::default());
    }

    let doc = Document::new(raw, config);
    let mut results = SearchResults {
        organic: numbered(organic_chain().run(&doc, request.limit, keep).records, |r, p| {
            r.position = p
        }),
        ..Default::default()
    };

    if request.wants(SearchFeature::Ads) {
        results.ads = numbered(ads_chain().run(&doc, 0, keep).records, |r, p| r.position = p);
    }
    if request.wants(SearchFeature::Questions) {
        results.questions = questions_chain().run(&doc, 0, keep).records;
    }
    if request.wants(SearchFeature::Featured) {
        results.featured = featured_chain().run(&doc, 1, keep).records.into_iter().next();
    }
    if request.wants(SearchFeature::Summary) {
        results.summary = summary_chain().run(&doc, 1, keep).records.into_iter().next();
    }
    if request.wants(SearchFeature::MapPack) {
        results.map_pack = map_pack_chain().run(&doc, 0, keep).records;
    }
    if request.wants(SearchFeature::InfoPanel) {
        results.info_panel = info_panel_chain().run(&doc, 1, keep).records.into_iter().next();
    }
    if request.wants(SearchFeature::Related) {
        results.related = related_chain().run(&doc, 0, keep).records;
    }

    results.total_found = results.organic.len();
    results.next_cursor = next_cursor(request.cursor, results.total_found);

    tracing::debug!(
        organic = results.organic.len(),
        ads = results.ads.len(),
        questions = results.questions.len(),
        map_pack = results.map_pack.len(),
        related = results.related.len(),
        "search extraction finished"
    );
    Ok(results)
}

fn keep<C>(candidate: C, _neighbours: Neighbours) -> C {
    candidate
}

/// Assign contiguous 1-based positions in list order
fn numbered<T>(mut records: Vec<T>, mut set: impl FnMut(&mut T, usize)) -> Vec<T> {
    for (i, record) in records.iter_mut().enumerate() {
        set(record, i + 1);
    }
    records
}

// ---------------------------------------------------------------------------
// DOM helpers shared by the feature strategies
// ---------------------------------------------------------------------------

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| GleanError::Selector(format!("{}: {:?}", css, e)))
}

/// Descendants of `element` matching `css`, in document order
pub(crate) fn select_in<'e>(element: ElementRef<'e>, css: &str) -> Result<Vec<ElementRef<'e>>> {
    let parsed = selector(css)?;
    Ok(element.select(&parsed).collect())
}

/// Text of the first descendant matching any of `selectors`, tried in order
pub(crate) fn first_text_in(element: ElementRef<'_>, selectors: &[&str]) -> Result<Option<String>> {
    for css in selectors {
        for found in select_in(element, css)? {
            let text = markup::element_text(&found);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }
    Ok(None)
}

/// First descendant link that resolves to an external destination
pub(crate) fn first_link_in(
    element: ElementRef<'_>,
    resolver: &UrlResolver<'_>,
) -> Result<Option<String>> {
    Ok(select_in(element, "a[href]")?
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolver.resolve(href)))
}

/// Whether the element sits inside a paid-results block
pub(crate) fn inside_ad_block(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .chain(std::iter::once(element))
        .any(|el| {
            let value = el.value();
            matches!(value.id(), Some("tads") | Some("bottomads") | Some("tadsb"))
                || value.attr("data-text-ad").is_some()
        })
}

/// Whether the element belongs to a question box or the side panel, whose
/// links are not results of their own
pub(crate) fn inside_feature_block(element: ElementRef<'_>) -> bool {
    closest(element, |el| {
        let value = el.value();
        value.id() == Some("rhs") || value.classes().any(|c| c == "related-question-pair")
    })
    .is_some()
}

/// Nearest ancestor (or the element itself) satisfying `predicate`
pub(crate) fn closest<'e>(
    element: ElementRef<'e>,
    predicate: impl Fn(&ElementRef<'e>) -> bool,
) -> Option<ElementRef<'e>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|el| predicate(el))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_round_trip_through_from_str() {
        for feature in SearchFeature::ALL {
            assert_eq!(feature.as_str().parse::<SearchFeature>(), Ok(feature));
        }
        assert_eq!("map-pack".parse::<SearchFeature>(), Ok(SearchFeature::MapPack));
        assert!("weather".parse::<SearchFeature>().is_err());
    }

    #[test]
    fn test_request_wants() {
        let request = SearchRequest::only(&[SearchFeature::Ads]);
        assert!(request.wants(SearchFeature::Ads));
        assert!(!request.wants(SearchFeature::Related));
        assert!(SearchRequest::default().wants(SearchFeature::InfoPanel));
    }

    #[test]
    fn test_numbered_positions() {
        let numbered = numbered(vec![(0, 'a'), (0, 'b')], |r, p| r.0 = p);
        assert_eq!(numbered, vec![(1, 'a'), (2, 'b')]);
    }

    #[test]
    fn test_inside_ad_block() {
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(
            r#"<div id="tads"><div><h3>Ad</h3></div></div><div id="rso"><h3>Organic</h3></div>"#,
            &config,
        );
        let headings = doc.select("h3").unwrap();
        assert!(inside_ad_block(headings[0]));
        assert!(!inside_ad_block(headings[1]));
    }
}
