//! Raw documents and the per-call parsed view strategies scan.
//!
//! A [`RawDocument`] is what the fetch layer hands us. [`Document`] wraps it
//! for the duration of one pipeline call, lazily building the DOM and the
//! visible-text index the first time a strategy asks for them.

use once_cell::unsync::OnceCell;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::error::{GleanError, Result};
use crate::markup::{self, TextNode};

/// Signatures of challenge, captcha, and block pages.
///
/// Matched case-insensitively against the raw markup.
pub const CHALLENGE_MARKERS: &[&str] = &[
    "our systems have detected unusual traffic",
    "unusual traffic from your computer network",
    "/sorry/index",
    "id=\"captcha-form\"",
    "g-recaptcha",
    "recaptcha/api.js",
    "please verify you are a human",
    "verify you are human",
    "cf-chl-",
    "challenge-platform",
    "attention required! | cloudflare",
    "checking your browser before accessing",
    "ddos-guard",
    "px-captcha",
    "request blocked by the security",
];

/// The unparsed input to one pipeline call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub text: String,
    /// Content length declared by the fetch layer
    pub content_length: usize,
}

impl RawDocument {
    /// Wrap a body, declaring its byte length as the content length
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let content_length = text.len();
        Self {
            text,
            content_length,
        }
    }

    /// Wrap a body with an explicitly declared content length
    pub fn with_content_length(text: impl Into<String>, content_length: usize) -> Self {
        Self {
            text: text.into(),
            content_length,
        }
    }

    /// Classify the document before any extraction runs
    pub fn classify(&self, config: &ExtractionConfig) -> DocumentState {
        if let Some(marker) = find_challenge_marker(&self.text, &config.extra_challenge_markers) {
            return DocumentState::Blocked { marker };
        }
        if self.content_length == 0 || self.text.trim().is_empty() {
            return DocumentState::Empty;
        }
        DocumentState::Parsed
    }

    /// Classify and turn a block page into the pipeline's one hard failure.
    ///
    /// Returns `Ok(false)` for an empty document so callers can short-circuit
    /// with an empty result.
    pub fn ensure_extractable(&self, config: &ExtractionConfig) -> Result<bool> {
        match self.classify(config) {
            DocumentState::Blocked { marker } => {
                tracing::warn!(%marker, "challenge page detected");
                Err(GleanError::ChallengeDetected { marker })
            }
            DocumentState::Empty => {
                tracing::debug!("empty document");
                Ok(false)
            }
            DocumentState::Parsed => Ok(true),
        }
    }
}

/// What a raw document turned out to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DocumentState {
    /// A challenge or block page; extraction must not proceed
    Blocked { marker: String },
    /// No usable content
    Empty,
    /// Ordinary content, possibly with nothing extractable in it
    Parsed,
}

/// Find the first challenge marker present in the markup
pub fn find_challenge_marker(html: &str, extra: &[String]) -> Option<String> {
    let lower = html.to_lowercase();
    CHALLENGE_MARKERS
        .iter()
        .map(|m| m.to_string())
        .chain(extra.iter().map(|m| m.to_lowercase()))
        .find(|marker| !marker.is_empty() && lower.contains(marker.as_str()))
}

/// Read-only view of a document for the duration of one pipeline call
pub struct Document<'a> {
    raw: &'a str,
    config: &'a ExtractionConfig,
    dom: OnceCell<Html>,
    nodes: OnceCell<Vec<TextNode>>,
}

impl<'a> Document<'a> {
    pub fn new(raw: &'a RawDocument, config: &'a ExtractionConfig) -> Self {
        Self::from_markup(&raw.text, config)
    }

    /// View over a bare markup string (tests and nested fragments)
    pub fn from_markup(raw: &'a str, config: &'a ExtractionConfig) -> Self {
        Self {
            raw,
            config,
            dom: OnceCell::new(),
            nodes: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn config(&self) -> &'a ExtractionConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Parsed DOM, built on first use
    pub fn dom(&self) -> &Html {
        self.dom.get_or_init(|| Html::parse_document(self.raw))
    }

    /// Visible text nodes with raw offsets, built on first use
    pub fn text_nodes(&self) -> &[TextNode] {
        self.nodes.get_or_init(|| markup::text_nodes(self.raw))
    }

    /// Run a CSS selector against the DOM
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let parsed = Selector::parse(selector)
            .map_err(|e| GleanError::Selector(format!("{}: {:?}", selector, e)))?;
        Ok(self.dom().select(&parsed).collect())
    }

    /// Byte offset of a visible string at or after `from`.
    ///
    /// DOM-based strategies find text without positions; this maps it back to
    /// the raw markup so a context window can be cut around it.
    pub fn locate(&self, needle: &str, from: usize) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        let from = markup::ceil_char_boundary(self.raw, from);
        if let Some(pos) = self.raw[from..].find(needle) {
            return Some(from + pos);
        }
        let lower = needle.to_lowercase();
        self.text_nodes()
            .iter()
            .filter(|node| node.offset >= from)
            .find(|node| node.text.to_lowercase().contains(&lower))
            .map(|node| node.offset)
    }

    /// Offset of the first case-insensitive occurrence of a marker
    pub fn find_marker(&self, marker: &str) -> Option<usize> {
        let lower_marker = marker.to_lowercase();
        self.text_nodes()
            .iter()
            .find(|node| node.text.to_lowercase().contains(&lower_marker))
            .map(|node| node.offset)
            .or_else(|| self.raw.find(marker))
    }
}
