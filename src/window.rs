//! Context windows - the bounded scan surface around one anchor

use crate::config::ExtractionConfig;
use crate::markup;

/// A slice of the raw document around an anchor, plus its visible text.
///
/// Field extractors never look outside this slice, which keeps a phone number
/// printed under one listing from being attributed to its neighbour.
#[derive(Debug, Clone)]
pub struct ContextWindow<'a> {
    /// Raw markup, attributes and embedded JSON included
    pub raw: &'a str,
    /// Visible text: tags stripped, entities decoded, whitespace collapsed
    pub text: String,
    /// Byte offset of `raw` within the document
    pub start: usize,
}

impl<'a> ContextWindow<'a> {
    /// Build a window directly over a fragment (tests, DOM-scoped blocks)
    pub fn from_fragment(raw: &'a str) -> Self {
        Self {
            raw,
            text: markup::strip_tags(raw),
            start: 0,
        }
    }
}

/// Offsets of the anchors found just before and just after one anchor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbours {
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

impl Neighbours {
    pub fn new(previous: Option<usize>, next: Option<usize>) -> Self {
        Self { previous, next }
    }
}

/// Cut the fixed-budget window around `offset`, clipped to document bounds
pub fn window<'a>(document: &'a str, offset: usize, config: &ExtractionConfig) -> ContextWindow<'a> {
    window_between(document, offset, Neighbours::default(), config)
}

/// Like [`window`], but never cross a neighbouring anchor.
///
/// The markup between two anchors belongs to the earlier one, so the window
/// ends at the next anchor and, when an earlier anchor exists, starts at
/// `offset` instead of looking behind it.
pub fn window_between<'a>(
    document: &'a str,
    offset: usize,
    neighbours: Neighbours,
    config: &ExtractionConfig,
) -> ContextWindow<'a> {
    let offset = offset.min(document.len());
    let look_behind = match neighbours.previous {
        Some(previous) if previous < offset => 0,
        _ => config.window_before,
    };
    let start = markup::floor_char_boundary(document, offset.saturating_sub(look_behind));

    let mut end = offset.saturating_add(config.window_after).min(document.len());
    if let Some(next) = neighbours.next {
        if next > offset {
            end = end.min(next);
        }
    }
    let end = markup::ceil_char_boundary(document, end);

    let raw = &document[start..end];
    ContextWindow {
        raw,
        text: markup::strip_tags(raw),
        start,
    }
}
