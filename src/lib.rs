pub mod assemble;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod document;
pub mod error;
pub mod fields;
pub mod links;
pub mod markup;
pub mod places;
pub mod records;
pub mod serp;
pub mod strategy;
pub mod validate;
pub mod window;

pub use config::{Config, ExtractionConfig};
pub use document::{DocumentState, RawDocument};
pub use error::{GleanError, Result};
pub use fields::Enrichment;
pub use places::{extract_places, PlacesRequest};
pub use serp::{extract_search, SearchFeature, SearchRequest, SearchResults};
pub use strategy::Page;
