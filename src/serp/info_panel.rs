//! The entity panel beside the results

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

use super::{closest, first_text_in, select_in};
use crate::dedup::name_key;
use crate::document::Document;
use crate::error::Result;
use crate::links::UrlResolver;
use crate::records::InfoPanel;
use crate::strategy::{Candidate, Strategy, StrategyChain};
use crate::validate::is_valid_title;

const TITLE_ATTR: &str = r#"[data-attrid="title"]"#;
const SUBTITLE_ATTR: &str = r#"[data-attrid="subtitle"]"#;
const DESCRIPTION_SELECTORS: &[&str] = &[r#"[data-attrid="description"] span"#, ".kno-rdesc span"];
const SITE_LINKS: &str =
    r#"a[data-attrid="visit_official_site"], [data-attrid="visit_official_site"] a[href]"#;

const ATTRIBUTE_ROWS: &str = r#"[data-attrid^="kc:/"], [data-attrid^="ss:/"], [data-attrid^="hw:/"]"#;
const KEY_SELECTORS: &[&str] = &[".w8qArf"];
const VALUE_SELECTORS: &[&str] = &[".LrzXr", ".kno-fv"];

const PANEL_SCOPES: &str = "#rhs, .kp-wholepage, .knowledge-panel";
const HEADING_SELECTORS: &[&str] = &[r#"[role="heading"]"#, "h2", "h3"];

/// Attribute keys that would duplicate the panel's own fields
const RESERVED_KEYS: &[&str] = &["title", "type", "subtitle", "description", "name"];

/// `Key: value` on one line; values with a colon are usually two rows run together
static KEY_VALUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Za-z ]{1,30}):\s*([^:]{1,200})$").expect("Invalid key/value regex")
});

impl Candidate for InfoPanel {
    fn dedup_key(&self) -> String {
        name_key(&self.title)
    }

    fn is_valid(&self) -> bool {
        is_valid_title(&self.title)
    }
}

/// Info panel strategies, most structured first
pub fn info_panel_chain() -> StrategyChain<'static, InfoPanel> {
    StrategyChain::new("info_panel")
        .with(AttributedPanel)
        .with(SidePanel)
}

/// Insert unless the key is reserved or already present; first seen wins
fn add_attribute(attributes: &mut IndexMap<String, String>, key: &str, value: &str) {
    let key = key.trim().trim_end_matches(':').trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return;
    }
    if RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key)) {
        return;
    }
    attributes
        .entry(key.to_string())
        .or_insert_with(|| value.to_string());
}

/// Keyed attribute rows, then any `Key: value` text in the panel
fn collect_attributes(scope: ElementRef<'_>) -> Result<IndexMap<String, String>> {
    let mut attributes = IndexMap::new();

    for row in select_in(scope, ATTRIBUTE_ROWS)? {
        let key = first_text_in(row, KEY_SELECTORS)?;
        let value = first_text_in(row, VALUE_SELECTORS)?;
        if let (Some(key), Some(value)) = (key, value) {
            add_attribute(&mut attributes, &key, &value);
        }
    }

    for element in select_in(scope, "div, li, tr, span")? {
        let text = crate::markup::element_text(&element);
        if let Some(caps) = KEY_VALUE_RE.captures(&text) {
            add_attribute(&mut attributes, &caps[1], &caps[2]);
        }
    }
    Ok(attributes)
}

fn official_site(scope: ElementRef<'_>, resolver: &UrlResolver<'_>) -> Result<Option<String>> {
    Ok(select_in(scope, SITE_LINKS)?
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolver.resolve(href)))
}

/// Panels whose fields carry `data-attrid` labels
pub struct AttributedPanel;

impl Strategy for AttributedPanel {
    type Output = InfoPanel;

    fn name(&self) -> &'static str {
        "attributed_panel"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<InfoPanel>> {
        let Some(title_el) = doc.select(TITLE_ATTR)?.into_iter().next() else {
            return Ok(Vec::new());
        };
        let title = crate::markup::element_text(&title_el);
        let scope = closest(title_el, |el| {
            let value = el.value();
            value.id() == Some("rhs")
                || value
                    .classes()
                    .any(|c| c == "kp-wholepage" || c == "knowledge-panel")
        })
        .unwrap_or_else(|| doc.dom().root_element());

        let resolver = UrlResolver::new(doc.config());
        Ok(vec![InfoPanel {
            title,
            kind: first_text_in(scope, &[SUBTITLE_ATTR])?,
            description: first_text_in(scope, DESCRIPTION_SELECTORS)?,
            url: official_site(scope, &resolver)?,
            attributes: collect_attributes(scope)?,
        }])
    }
}

/// Side column panels with only a heading to go on
pub struct SidePanel;

impl Strategy for SidePanel {
    type Output = InfoPanel;

    fn name(&self) -> &'static str {
        "side_panel"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<InfoPanel>> {
        let resolver = UrlResolver::new(doc.config());
        let mut panels = Vec::new();

        for scope in doc.select(PANEL_SCOPES)? {
            let Some(title) = first_text_in(scope, HEADING_SELECTORS)? else {
                continue;
            };
            panels.push(InfoPanel {
                title,
                kind: None,
                description: first_text_in(scope, DESCRIPTION_SELECTORS)?,
                url: official_site(scope, &resolver)?,
                attributes: collect_attributes(scope)?,
            });
        }
        Ok(panels)
    }
}
