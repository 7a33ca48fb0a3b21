//! Organic (unpaid) results

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::{closest, first_text_in, inside_ad_block, inside_feature_block, select_in};
use crate::dedup::url_key;
use crate::document::Document;
use crate::error::Result;
use crate::links::{display_url, host_of, UrlResolver};
use crate::markup;
use crate::records::{OrganicResult, Sitelink};
use crate::strategy::{Candidate, Strategy, StrategyChain};
use crate::validate::is_valid_title;

/// Result containers, outermost first; nested matches dedup by URL
const RESULT_BLOCKS: &str = "div.g, div.tF2Cxc, div.MjjYud";

const SNIPPET_SELECTORS: &[&str] = &[".VwiC3b", ".st", "[data-sncf]", ".IsZvec", ".lEBKkf"];

const MAX_SITELINKS: usize = 8;

/// How far past a heading link the regex fallback looks for a snippet
const SNIPPET_LOOKAHEAD: usize = 1500;

/// Publication date printed ahead of a snippet and separated by a dash
static DATE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((?:[A-Z][a-z]{2,8}\.? \d{1,2}, \d{4})|(?:\d{1,2} [A-Z][a-z]{2,8}\.? \d{4})|(?:\d+ (?:minute|hour|day|week|month|year)s? ago))\s*[—–·-]\s*",
    )
    .expect("Invalid date prefix regex")
});

static ANCHOR_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href="([^"]+)"[^>]*>\s*(?:<[^>]+>\s*)*?<h3[^>]*>(.*?)</h3>"#)
        .expect("Invalid anchor heading regex")
});

static RAW_SNIPPET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)class="(?:[^"]*\s)?(?:VwiC3b|st|IsZvec)(?:\s[^"]*)?"[^>]*>(.*?)</(?:div|span)>"#)
        .expect("Invalid raw snippet regex")
});

impl Candidate for OrganicResult {
    fn dedup_key(&self) -> String {
        url_key(&self.url)
    }

    fn is_valid(&self) -> bool {
        !self.url.is_empty() && is_valid_title(&self.title)
    }
}

/// Organic strategies, most structured first
pub fn organic_chain() -> StrategyChain<'static, OrganicResult> {
    StrategyChain::new("organic")
        .with(ResultBlocks)
        .with(HeadingLinks)
        .with(AnchorHeadingText)
}

/// Classed result containers
pub struct ResultBlocks;

impl Strategy for ResultBlocks {
    type Output = OrganicResult;

    fn name(&self) -> &'static str {
        "result_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<OrganicResult>> {
        let resolver = UrlResolver::new(doc.config());
        let mut results = Vec::new();

        for block in doc.select(RESULT_BLOCKS)? {
            if inside_ad_block(block) || inside_feature_block(block) {
                continue;
            }
            if let Some(result) = read_block(block, &resolver)? {
                results.push(result);
            }
        }
        Ok(results)
    }
}

fn read_block(block: ElementRef<'_>, resolver: &UrlResolver<'_>) -> Result<Option<OrganicResult>> {
    let heading = select_in(block, "h3")?.into_iter().next();

    let (title, url) = match heading {
        Some(heading) => {
            let title = markup::element_text(&heading);
            let url = closest(heading, |el| el.value().name() == "a")
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolver.resolve(href));
            let url = match url {
                Some(url) => Some(url),
                None => super::first_link_in(block, resolver)?,
            };
            (title, url)
        }
        // only the classic container is trusted without a heading
        None if block.value().classes().any(|c| c == "g") => {
            let first = select_in(block, "a[href]")?.into_iter().find_map(|a| {
                let url = resolver.resolve(a.value().attr("href")?)?;
                Some((markup::element_text(&a), url))
            });
            match first {
                Some((title, url)) => (title, Some(url)),
                None => return Ok(None),
            }
        }
        None => return Ok(None),
    };
    let Some(url) = url else {
        return Ok(None);
    };

    let (date, snippet) = split_date(&first_text_in(block, SNIPPET_SELECTORS)?.unwrap_or_default());
    let display = first_text_in(block, &["cite"])?.unwrap_or_else(|| display_url(&url));

    Ok(Some(OrganicResult {
        position: 0,
        sitelinks: sitelinks(block, &title, &url, resolver)?,
        cached: has_cached_link(block)?,
        title,
        url,
        display_url: display,
        snippet,
        date,
    }))
}

/// Secondary links to the same site, excluding the main one
fn sitelinks(
    block: ElementRef<'_>,
    title: &str,
    url: &str,
    resolver: &UrlResolver<'_>,
) -> Result<Vec<Sitelink>> {
    let host = host_of(url);
    let mut seen = vec![url_key(url)];
    let mut links = Vec::new();

    for anchor in select_in(block, "a[href]")? {
        let Some(link) = anchor.value().attr("href").and_then(|h| resolver.resolve(h)) else {
            continue;
        };
        let text = markup::element_text(&anchor);
        let key = url_key(&link);
        if seen.contains(&key)
            || text == title
            || !is_valid_title(&text)
            || is_result_chrome(&text)
            || host_of(&link) != host
        {
            continue;
        }
        seen.push(key);
        links.push(Sitelink { title: text, url: link });
        if links.len() == MAX_SITELINKS {
            break;
        }
    }
    Ok(links)
}

fn is_result_chrome(text: &str) -> bool {
    matches!(
        text.to_ascii_lowercase().as_str(),
        "cached" | "similar" | "translate this page" | "more results from this site"
    )
}

fn has_cached_link(block: ElementRef<'_>) -> Result<bool> {
    Ok(select_in(block, "a[href]")?.into_iter().any(|a| {
        a.value()
            .attr("href")
            .map(|h| h.contains("webcache.googleusercontent.com"))
            .unwrap_or(false)
            || markup::element_text(&a).eq_ignore_ascii_case("cached")
    }))
}

/// Separate a leading publication date from the snippet text
fn split_date(snippet: &str) -> (Option<String>, String) {
    match DATE_PREFIX_RE.captures(snippet) {
        Some(caps) => {
            let rest = snippet[caps.get(0).map(|m| m.end()).unwrap_or(0)..].to_string();
            (Some(caps[1].to_string()), rest)
        }
        None => (None, snippet.to_string()),
    }
}

/// Headings wrapped in links, wherever they sit
pub struct HeadingLinks;

impl Strategy for HeadingLinks {
    type Output = OrganicResult;

    fn name(&self) -> &'static str {
        "heading_links"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<OrganicResult>> {
        let resolver = UrlResolver::new(doc.config());
        let mut results = Vec::new();

        for heading in doc.select("a[href] h3")? {
            if inside_ad_block(heading) || inside_feature_block(heading) {
                continue;
            }
            let Some(url) = closest(heading, |el| el.value().name() == "a")
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolver.resolve(href))
            else {
                continue;
            };

            let mut snippet = String::new();
            for ancestor in heading.ancestors().filter_map(ElementRef::wrap).take(5) {
                if let Some(text) = first_text_in(ancestor, SNIPPET_SELECTORS)? {
                    snippet = text;
                    break;
                }
            }
            let (date, snippet) = split_date(&snippet);

            results.push(OrganicResult {
                position: 0,
                title: markup::element_text(&heading),
                display_url: display_url(&url),
                url,
                snippet,
                sitelinks: Vec::new(),
                date,
                cached: false,
            });
        }
        Ok(results)
    }
}

/// `<a href><h3>` pairs found in the raw markup, for documents the DOM
/// parser reshapes
pub struct AnchorHeadingText;

impl Strategy for AnchorHeadingText {
    type Output = OrganicResult;

    fn name(&self) -> &'static str {
        "anchor_heading_text"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<OrganicResult>> {
        let resolver = UrlResolver::new(doc.config());
        let raw = doc.raw();
        let mut results = Vec::new();

        // heading links the DOM places in ad or feature blocks
        let excluded: Vec<String> = doc
            .select("a[href] h3")?
            .into_iter()
            .filter(|h| inside_ad_block(*h) || inside_feature_block(*h))
            .filter_map(|h| {
                let href = closest(h, |el| el.value().name() == "a")?.value().attr("href")?;
                resolver.resolve(href)
            })
            .map(|url| url_key(&url))
            .collect();

        for caps in ANCHOR_HEADING_RE.captures_iter(raw) {
            let href = &caps[1];
            if href.contains("/aclk") || href.contains("googleadservices") {
                continue;
            }
            let Some(url) = resolver.resolve(href) else {
                continue;
            };
            if excluded.contains(&url_key(&url)) {
                continue;
            }
            let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let horizon = markup::floor_char_boundary(raw, end + SNIPPET_LOOKAHEAD);
            let snippet = RAW_SNIPPET_RE
                .captures(&raw[end..horizon])
                .map(|c| markup::strip_tags(&c[1]))
                .unwrap_or_default();
            let (date, snippet) = split_date(&snippet);

            results.push(OrganicResult {
                position: 0,
                title: markup::strip_tags(&caps[2]),
                display_url: display_url(&url),
                url,
                snippet,
                sitelinks: Vec::new(),
                date,
                cached: false,
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    const CLASSIC: &str = r#"<div class="g"><a href="/url?q=https://example.com/page">Example Title</a><span class="st">An example snippet.</span></div>"#;

    const MODERN: &str = r#"
        <div id="tads"><div data-text-ad="1"><a href="/aclk?adurl=https://ads.example.net/"><h3>Sponsored Pizza</h3></a></div></div>
        <div id="rso">
          <div class="MjjYud"><div class="g"><div class="tF2Cxc">
            <a href="https://www.rust-lang.org/"><h3>Rust Programming Language</h3><cite>https://www.rust-lang.org</cite></a>
            <div class="VwiC3b">Mar 3, 2024 — A language empowering everyone.</div>
            <a href="https://www.rust-lang.org/learn">Learn</a>
            <a href="https://www.rust-lang.org/tools/install">Install</a>
            <a href="https://webcache.googleusercontent.com/search?q=cache:rust">Cached</a>
          </div></div></div>
          <div class="MjjYud"><div class="g">
            <a href="https://doc.rust-lang.org/book/"><h3>The Rust Book</h3></a>
            <div class="VwiC3b">Learn Rust from first principles.</div>
          </div></div>
        </div>
    "#;

    fn run(html: &str) -> Vec<OrganicResult> {
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        organic_chain().run(&doc, 0, |r, _| r).records
    }

    #[test]
    fn test_classic_block_without_heading() {
        let results = run(CLASSIC);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Example Title");
        assert_eq!(results[0].url, "https://example.com/page");
        assert_eq!(results[0].snippet, "An example snippet.");
        assert_eq!(results[0].display_url, "example.com/page");
    }

    #[test]
    fn test_nested_containers_dedup_and_skip_ads() {
        let results = run(MODERN);
        let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust Programming Language", "The Rust Book"]);
    }

    #[test]
    fn test_block_details() {
        let results = run(MODERN);
        let rust = &results[0];
        assert_eq!(rust.date.as_deref(), Some("Mar 3, 2024"));
        assert_eq!(rust.snippet, "A language empowering everyone.");
        assert_eq!(rust.display_url, "https://www.rust-lang.org");
        assert!(rust.cached);
        let sitelinks: Vec<_> = rust.sitelinks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(sitelinks, vec!["Learn", "Install"]);
    }

    #[test]
    fn test_heading_links_without_classes() {
        let html = r#"<div><div><a href="https://example.org/a"><h3>First Article</h3></a><span class="st">Body one.</span></div></div>"#;
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        let results = HeadingLinks.attempt(&doc).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].snippet, "Body one.");
    }

    #[test]
    fn test_anchor_heading_text_regex() {
        let html = r#"<a class="x" href="/url?q=https://example.org/b&amp;sa=U"><br><h3 class="LC20lb">Second <b>Article</b></h3></a><div class="VwiC3b">2 days ago - Fresh text.</div>"#;
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        let results = AnchorHeadingText.attempt(&doc).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Second Article");
        assert_eq!(results[0].url, "https://example.org/b");
        assert_eq!(results[0].date.as_deref(), Some("2 days ago"));
        assert_eq!(results[0].snippet, "Fresh text.");
    }

    #[test]
    fn test_internal_links_are_not_results() {
        let html = r#"<div class="g"><a href="/search?q=rust&tbm=isch">Images</a></div>"#;
        assert!(run(html).is_empty());
    }
}
