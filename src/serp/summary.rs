//! The generated summary panel ("AI Overview") and its cited sources

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::select_in;
use crate::dedup::{name_key, url_key};
use crate::document::Document;
use crate::error::Result;
use crate::links::{display_url, UrlResolver};
use crate::markup;
use crate::records::{SourceLink, SummaryPanel};
use crate::strategy::{Candidate, Strategy, StrategyChain};

const SUMMARY_CONTAINERS: &str = r#"[data-subtree="aimc"], [data-attrid="AIOverview"]"#;

const MARKER: &str = "AI Overview";

/// Text that closes the panel when no container is available
const STOP_MARKERS: &[&str] = &[
    "AI responses may include mistakes",
    "People also ask",
    "Related searches",
];

const MARKER_REGION: usize = 8000;

const MIN_SUMMARY_CHARS: usize = 20;

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href="([^"]+)"[^>]*>(.*?)</a>"#).expect("Invalid anchor regex")
});

impl Candidate for SummaryPanel {
    fn dedup_key(&self) -> String {
        name_key(&markup::truncate_chars(&self.text, 120))
    }

    fn is_valid(&self) -> bool {
        self.text.chars().count() >= MIN_SUMMARY_CHARS
    }
}

/// Summary strategies, most structured first
pub fn summary_chain() -> StrategyChain<'static, SummaryPanel> {
    StrategyChain::new("summary")
        .with(SummaryBlocks)
        .with(MarkedSummary)
}

fn without_label(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.get(..MARKER.len()) {
        Some(head) if head.eq_ignore_ascii_case(MARKER) => trimmed[MARKER.len()..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Adds a source unless its URL was already cited
fn push_source(sources: &mut Vec<SourceLink>, title: String, url: String) {
    let key = url_key(&url);
    if sources.iter().any(|s| url_key(&s.url) == key) {
        return;
    }
    let title = if title.is_empty() { display_url(&url) } else { title };
    sources.push(SourceLink { title, url });
}

/// Panel containers
pub struct SummaryBlocks;

impl Strategy for SummaryBlocks {
    type Output = SummaryPanel;

    fn name(&self) -> &'static str {
        "summary_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<SummaryPanel>> {
        let resolver = UrlResolver::new(doc.config());
        let mut panels = Vec::new();

        for container in doc.select(SUMMARY_CONTAINERS)? {
            let mut sources = Vec::new();
            let mut text_parts = Vec::new();
            collect_text(container, &mut text_parts);

            for anchor in select_in(container, "a[href]")? {
                let Some(url) = anchor.value().attr("href").and_then(|h| resolver.resolve(h)) else {
                    continue;
                };
                let title = match markup::element_text(&anchor) {
                    t if t.is_empty() => anchor
                        .value()
                        .attr("aria-label")
                        .map(markup::collapse_whitespace)
                        .unwrap_or_default(),
                    t => t,
                };
                push_source(&mut sources, title, url);
            }

            panels.push(SummaryPanel {
                text: without_label(&markup::collapse_whitespace(&text_parts.join(" "))),
                sources,
            });
        }
        Ok(panels)
    }
}

/// Visible text outside links; link text belongs to the sources
fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            parts.push(String::from(&**text));
        } else if let Some(el) = ElementRef::wrap(child) {
            if !matches!(el.value().name(), "a" | "script" | "style") {
                collect_text(el, parts);
            }
        }
    }
}

/// Text between the panel label and the next section
pub struct MarkedSummary;

impl Strategy for MarkedSummary {
    type Output = SummaryPanel;

    fn name(&self) -> &'static str {
        "marked_summary"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<SummaryPanel>> {
        let Some(marker) = doc.find_marker(MARKER) else {
            return Ok(Vec::new());
        };
        let raw = doc.raw();
        let horizon = markup::floor_char_boundary(raw, marker + MARKER_REGION);
        let end = STOP_MARKERS
            .iter()
            .filter_map(|stop| raw[marker..horizon].find(stop))
            .min()
            .map(|pos| marker + pos)
            .unwrap_or(horizon);
        let region = &raw[marker..end];

        let resolver = UrlResolver::new(doc.config());
        let mut sources = Vec::new();
        for caps in ANCHOR_RE.captures_iter(region) {
            if let Some(url) = resolver.resolve(&caps[1]) {
                push_source(&mut sources, markup::strip_tags(&caps[2]), url);
            }
        }

        let text = without_label(&markup::strip_tags(&ANCHOR_RE.replace_all(region, " ")));
        Ok(vec![SummaryPanel { text, sources }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn first(html: &str) -> Option<SummaryPanel> {
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        summary_chain().run(&doc, 1, |p, _| p).records.into_iter().next()
    }

    #[test]
    fn test_container_panel_with_sources() {
        let html = r#"
            <div data-subtree="aimc">
              <h2>AI Overview</h2>
              <div>Pizza dough should rest for at least 24 hours in the fridge.</div>
              <a href="https://dough.example/rest">Dough Resting Guide</a>
              <a href="https://dough.example/rest#step-2">Dough Resting Guide</a>
              <a href="/search?q=pizza">pizza</a>
            </div>
        "#;
        let panel = first(html).unwrap();
        assert_eq!(panel.text, "Pizza dough should rest for at least 24 hours in the fridge.");
        assert_eq!(
            panel.sources,
            vec![SourceLink {
                title: "Dough Resting Guide".into(),
                url: "https://dough.example/rest".into(),
            }]
        );
    }

    #[test]
    fn test_marker_panel_stops_at_next_section() {
        let html = r#"
            <div>AI Overview</div>
            <p>Cold fermentation develops flavour and improves texture.</p>
            <a href="https://bread.example/ferment">Fermentation 101</a>
            <div>People also ask</div>
            <a href="https://other.example/">Other</a>
        "#;
        let panel = first(html).unwrap();
        assert_eq!(panel.text, "Cold fermentation develops flavour and improves texture.");
        assert_eq!(panel.sources.len(), 1);
        assert_eq!(panel.sources[0].title, "Fermentation 101");
    }

    #[test]
    fn test_no_panel() {
        assert!(first("<p>Nothing generated here.</p>").is_none());
    }
}
