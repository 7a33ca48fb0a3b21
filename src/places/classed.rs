//! Listings found through semantically classed markup

use crate::assemble::Anchor;
use crate::document::Document;
use crate::error::Result;
use crate::markup;
use crate::strategy::Strategy;

/// Where the name lives on a matched element
#[derive(Clone, Copy)]
enum NameSource {
    AriaLabel,
    Text,
}

/// Name-bearing elements, most specific first
const NAME_SELECTORS: &[(&str, NameSource)] = &[
    (r#"div[role="article"][aria-label]"#, NameSource::AriaLabel),
    (r#"a[aria-label][href*="/maps/place/"]"#, NameSource::AriaLabel),
    (".qBF1Pd", NameSource::Text),
    (".fontHeadlineSmall", NameSource::Text),
    (".dbg0pd", NameSource::Text),
    (".OSrXXb", NameSource::Text),
    (r#"[class*="business-name"]"#, NameSource::Text),
    (r#"[itemtype*="LocalBusiness"] [itemprop="name"]"#, NameSource::Text),
];

pub struct ClassedMarkup;

impl Strategy for ClassedMarkup {
    type Output = Anchor;

    fn name(&self) -> &'static str {
        "classed_markup"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<Anchor>> {
        let mut anchors = Vec::new();

        for (selector, source) in NAME_SELECTORS {
            let mut from = 0;
            for element in doc.select(selector)? {
                let name = match source {
                    NameSource::AriaLabel => element
                        .value()
                        .attr("aria-label")
                        .map(markup::collapse_whitespace)
                        .unwrap_or_default(),
                    NameSource::Text => markup::element_text(&element),
                };
                if name.is_empty() {
                    continue;
                }
                let Some(offset) = doc.locate(&name, from) else {
                    tracing::trace!(%name, selector, "classed name not found in raw markup");
                    continue;
                };
                from = offset + 1;
                anchors.push(Anchor::new(&name, offset, self.name()));
            }
        }

        // records follow document order, whichever selector found them
        anchors.sort_by_key(|a| a.offset);
        Ok(anchors)
    }
}
