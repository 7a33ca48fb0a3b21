//! The featured answer passage and its layout

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::{closest, first_link_in, first_text_in, select_in};
use crate::dedup::name_key;
use crate::document::Document;
use crate::error::Result;
use crate::links::UrlResolver;
use crate::markup;
use crate::records::{FeaturedPassage, PassageShape};
use crate::strategy::{Candidate, Strategy, StrategyChain};

const PASSAGE_CONTAINERS: &str = ".xpdopen, block-component";

const PARAGRAPH_SELECTORS: &[&str] = &[
    ".hgKElc",
    ".LGOjhe",
    ".IZ6rdc",
    r#"[data-attrid="wa:/description"]"#,
];

const MARKERS: &[&str] = &["Featured snippet from the web", "Featured snippet"];

/// Raw bytes after the marker that belong to the passage
const MARKER_REGION: usize = 4000;

const MIN_PASSAGE_CHARS: usize = 20;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h3[^>]*>(.*?)</h3>").expect("Invalid heading regex"));

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="([^"]+)""#).expect("Invalid href regex"));

impl Candidate for FeaturedPassage {
    fn dedup_key(&self) -> String {
        name_key(&markup::truncate_chars(&self.text, 120))
    }

    fn is_valid(&self) -> bool {
        self.text.chars().count() >= MIN_PASSAGE_CHARS
    }
}

/// Featured passage strategies, most structured first
pub fn featured_chain() -> StrategyChain<'static, FeaturedPassage> {
    StrategyChain::new("featured")
        .with(PassageBlocks)
        .with(MarkedPassage)
}

/// Classed answer containers, shape read from their markup
pub struct PassageBlocks;

impl Strategy for PassageBlocks {
    type Output = FeaturedPassage;

    fn name(&self) -> &'static str {
        "passage_blocks"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<FeaturedPassage>> {
        let resolver = UrlResolver::new(doc.config());
        let mut passages = Vec::new();

        for container in doc.select(PASSAGE_CONTAINERS)? {
            // expanded question answers reuse the same container classes
            let in_question = closest(container, |el| {
                el.value().classes().any(|c| c == "related-question-pair")
            })
            .is_some();
            if in_question {
                continue;
            }
            let Some((text, shape)) = read_passage(container)? else {
                continue;
            };

            let heading = select_in(container, "h3")?.into_iter().next();
            let url = match heading
                .and_then(|h| closest(h, |el| el.value().name() == "a"))
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolver.resolve(href))
            {
                Some(url) => Some(url),
                None => first_link_in(container, &resolver)?,
            };

            passages.push(FeaturedPassage {
                text,
                url,
                title: heading.map(|h| markup::element_text(&h)),
                shape,
            });
        }
        Ok(passages)
    }
}

/// Passage text and layout; tables win over lists, lists over paragraphs
fn read_passage(container: ElementRef<'_>) -> Result<Option<(String, PassageShape)>> {
    if let Some(table) = select_in(container, "table")?.into_iter().next() {
        let rows: Vec<String> = select_in(table, "tr")?
            .into_iter()
            .map(|row| {
                select_in(row, "th, td")
                    .map(|cells| {
                        cells
                            .iter()
                            .map(markup::element_text)
                            .collect::<Vec<_>>()
                            .join(" | ")
                    })
                    .unwrap_or_default()
            })
            .filter(|row| !row.is_empty())
            .collect();
        if !rows.is_empty() {
            return Ok(Some((rows.join("\n"), PassageShape::Table)));
        }
    }

    let items: Vec<String> = select_in(container, "ol li, ul li")?
        .iter()
        .map(markup::element_text)
        .filter(|item| !item.is_empty())
        .collect();
    if !items.is_empty() {
        return Ok(Some((items.join("\n"), PassageShape::List)));
    }

    Ok(first_text_in(container, PARAGRAPH_SELECTORS)?.map(|text| (text, PassageShape::Paragraph)))
}

/// Text following the passage label, up to the source heading
pub struct MarkedPassage;

impl Strategy for MarkedPassage {
    type Output = FeaturedPassage;

    fn name(&self) -> &'static str {
        "marked_passage"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<FeaturedPassage>> {
        let Some(marker) = MARKERS.iter().find_map(|m| doc.find_marker(m)) else {
            return Ok(Vec::new());
        };
        let raw = doc.raw();
        let end = markup::floor_char_boundary(raw, marker + MARKER_REGION);
        let region = &raw[marker..end];

        let heading = HEADING_RE.captures(region);
        let body_end = heading
            .as_ref()
            .and_then(|c| c.get(0))
            .map(|m| marker + m.start())
            .unwrap_or(end);
        let body = &raw[marker..body_end];

        let text = doc
            .text_nodes()
            .iter()
            .filter(|node| node.offset > marker && node.offset < body_end)
            .map(|node| node.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let resolver = UrlResolver::new(doc.config());
        let url = HREF_RE
            .captures_iter(region)
            .find_map(|c| resolver.resolve(&c[1]));

        Ok(vec![FeaturedPassage {
            text,
            url,
            title: heading.map(|c| markup::strip_tags(&c[1])),
            shape: shape_of(body),
        }])
    }
}

/// Layout guessed from raw markup; plain text stays unknown
fn shape_of(body: &str) -> PassageShape {
    let lower = body.to_ascii_lowercase();
    if lower.contains("<table") {
        PassageShape::Table
    } else if lower.contains("<li") {
        PassageShape::List
    } else {
        PassageShape::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn first(html: &str) -> Option<FeaturedPassage> {
        let config = ExtractionConfig::default();
        let doc = Document::from_markup(html, &config);
        featured_chain().run(&doc, 1, |p, _| p).records.into_iter().next()
    }

    #[test]
    fn test_paragraph_passage() {
        let html = r#"
            <div class="xpdopen">
              <span class="hgKElc">Neapolitan pizza is baked at about 485 °C for 60 to 90 seconds.</span>
              <a href="https://pizza.example/guide"><h3>Neapolitan Pizza Guide</h3></a>
            </div>
        "#;
        let passage = first(html).unwrap();
        assert_eq!(passage.shape, PassageShape::Paragraph);
        assert!(passage.text.starts_with("Neapolitan pizza is baked"));
        assert_eq!(passage.url.as_deref(), Some("https://pizza.example/guide"));
        assert_eq!(passage.title.as_deref(), Some("Neapolitan Pizza Guide"));
    }

    #[test]
    fn test_list_and_table_shapes() {
        let list = r#"<block-component><ol><li>Preheat the oven</li><li>Stretch the dough</li></ol></block-component>"#;
        let passage = first(list).unwrap();
        assert_eq!(passage.shape, PassageShape::List);
        assert_eq!(passage.text, "Preheat the oven\nStretch the dough");

        let table = r#"<div class="xpdopen"><table><tr><th>Size</th><th>Slices</th></tr><tr><td>Large</td><td>8</td></tr></table></div>"#;
        let passage = first(table).unwrap();
        assert_eq!(passage.shape, PassageShape::Table);
        assert_eq!(passage.text, "Size | Slices\nLarge | 8");
    }

    #[test]
    fn test_marker_fallback_is_unknown_shape() {
        let html = r#"
            <div>Featured snippet from the web</div>
            <div>Sourdough needs a long cold ferment for the best flavour.</div>
            <a href="https://bread.example/sourdough"><h3>Sourdough Basics</h3></a>
        "#;
        let passage = first(html).unwrap();
        assert_eq!(passage.shape, PassageShape::Unknown);
        assert_eq!(passage.text, "Sourdough needs a long cold ferment for the best flavour.");
        assert_eq!(passage.url.as_deref(), Some("https://bread.example/sourdough"));
        assert_eq!(passage.title.as_deref(), Some("Sourdough Basics"));
    }

    #[test]
    fn test_question_answers_are_not_featured() {
        let html = r#"<div class="related-question-pair"><div class="xpdopen"><span class="hgKElc">An answer inside a question box.</span></div></div>"#;
        assert!(first(html).is_none());
    }
}
