//! Markup-to-text helpers shared by strategies and field extractors.
//!
//! Nothing here understands the document's layout; these functions only turn
//! raw markup into comparable text and remember where that text came from.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::ElementRef;

// Pre-compiled regex for whitespace normalization (compile once, use many times)
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex pattern")
});

/// Tags and comments, in document order
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("Invalid HTML tag regex")
});

static TAG_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(/?)\s*([a-zA-Z][a-zA-Z0-9-]*)").expect("Invalid tag name regex")
});

static NUMERIC_ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#(x[0-9a-fA-F]{1,6}|[0-9]{1,7});").expect("Invalid numeric entity regex")
});

/// Elements whose content is never visible text
const OPAQUE_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// A run of visible text and the byte offset where it starts in the raw markup
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub offset: usize,
    pub text: String,
}

/// Collapse runs of whitespace into a single space and trim the ends
pub fn collapse_whitespace(content: &str) -> String {
    WHITESPACE_RE.replace_all(content, " ").trim().to_string()
}

/// Decode the HTML entities that show up in search markup
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let text = NUMERIC_ENTITY_RE.replace_all(text, |caps: &Captures<'_>| {
        let body = &caps[1];
        let code = match body.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => body.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&middot;", "·")
        .replace("&bull;", "•")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
        .replace("&amp;", "&")
}

/// Strip tags (and the bodies of script/style elements) from markup,
/// returning decoded, whitespace-collapsed visible text
pub fn strip_tags(html: &str) -> String {
    let nodes = text_nodes(html);
    let joined = nodes
        .iter()
        .map(|node| node.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Split markup into visible text nodes, keeping each node's raw byte offset
pub fn text_nodes(html: &str) -> Vec<TextNode> {
    let mut nodes = Vec::new();
    let mut cursor = 0;
    let mut opaque: Option<String> = None;

    for tag in TAG_RE.find_iter(html) {
        if opaque.is_none() {
            push_text_node(&mut nodes, html, cursor, tag.start());
        }
        cursor = tag.end();

        let Some(caps) = TAG_NAME_RE.captures(tag.as_str()) else {
            continue;
        };
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();

        match &opaque {
            Some(open) if closing && *open == name => opaque = None,
            None if !closing && OPAQUE_ELEMENTS.contains(&name.as_str()) => {
                if !tag.as_str().ends_with("/>") {
                    opaque = Some(name);
                }
            }
            _ => {}
        }
    }

    if opaque.is_none() {
        push_text_node(&mut nodes, html, cursor, html.len());
    }

    nodes
}

fn push_text_node(nodes: &mut Vec<TextNode>, html: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let slice = &html[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let text = collapse_whitespace(&decode_entities(slice));
    if !text.is_empty() {
        nodes.push(TextNode {
            offset: start + leading,
            text,
        });
    }
}

/// Visible text of an element, decoded and whitespace-collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&joined)
}

/// Truncate a string to max_len characters (not bytes), adding "..." if truncated.
pub fn truncate_chars(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", truncated.trim_end())
}

/// Largest char boundary at or below `index`
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
