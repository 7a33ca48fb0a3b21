//! Last resort: any plausible name sitting just before a rating

use once_cell::sync::Lazy;
use regex::Regex;

use crate::assemble::Anchor;
use crate::document::Document;
use crate::error::Result;
use crate::strategy::Strategy;
use crate::validate::is_valid_name;

/// How many text nodes to look back from a rating for its name
const LOOKBACK_NODES: usize = 6;

/// A text node that starts with a star rating
static RATING_NODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[1-5][.,][0-9](?:\s*(?:\(|★|stars?\b)|\s*$)").expect("Invalid rating node regex")
});

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d\s.,()$€£¥₩·•★+%-]*$").expect("Invalid numeric regex")
});

pub struct LooseText;

impl Strategy for LooseText {
    type Output = Anchor;

    fn name(&self) -> &'static str {
        "loose_text"
    }

    fn attempt(&self, doc: &Document<'_>) -> Result<Vec<Anchor>> {
        let nodes = doc.text_nodes();
        let mut anchors = Vec::new();

        for (i, node) in nodes.iter().enumerate() {
            if !RATING_NODE_RE.is_match(&node.text) {
                continue;
            }
            let earliest = i.saturating_sub(LOOKBACK_NODES);
            let name = nodes[earliest..i]
                .iter()
                .rev()
                .filter(|n| !NUMERIC_RE.is_match(&n.text))
                .find(|n| is_valid_name(&n.text));
            if let Some(name) = name {
                anchors.push(Anchor::new(&name.text, name.offset, self.name()));
            }
        }
        Ok(anchors)
    }
}
