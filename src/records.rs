//! Output records - the wire schema handed to the boundary layer
//!
//! Field names serialize in camelCase and absent values serialize as `null`;
//! downstream consumers depend on both.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opening hours keyed by full day name, in the order they were found
pub type Hours = IndexMap<String, String>;

/// Latitude/longitude in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build coordinates only when both values are in range
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let coords = Self {
            latitude,
            longitude,
        };
        coords.is_valid().then_some(coords)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A business listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub hours: Option<Hours>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub categories: Vec<String>,
    pub coordinates: Option<Coordinates>,
    pub place_id: Option<String>,
    pub price_level: Option<String>,
    pub permanently_closed: bool,
}

/// A secondary link shown under an organic result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sitelink {
    pub title: String,
    pub url: String,
}

/// An unpaid search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganicResult {
    pub position: usize,
    pub title: String,
    pub url: String,
    pub display_url: String,
    pub snippet: String,
    pub sitelinks: Vec<Sitelink>,
    pub date: Option<String>,
    pub cached: bool,
}

/// A paid search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdResult {
    pub position: usize,
    pub title: String,
    pub url: String,
    pub display_url: String,
    pub description: String,
    pub is_top: bool,
}

/// One entry of a question/answer box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub snippet: Option<String>,
    pub url: Option<String>,
}

/// How a featured passage is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassageShape {
    Paragraph,
    List,
    Table,
    Unknown,
}

/// The highlighted answer passage above the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedPassage {
    pub text: String,
    pub url: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub shape: PassageShape,
}

/// A source cited by the summary panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub url: String,
}

/// The generated summary panel and the sources it cites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryPanel {
    pub text: String,
    pub sources: Vec<SourceLink>,
}

/// One listing in the map pack embedded in search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPackEntry {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub category: Option<String>,
    pub phone: Option<String>,
}

/// The entity panel beside the results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoPanel {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub attributes: IndexMap<String, String>,
}

/// A related search query
pub type RelatedQuery = String;
