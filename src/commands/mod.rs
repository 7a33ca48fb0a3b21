//! Command implementations for the glean CLI

mod extract;
mod misc;

pub use extract::*;
pub use misc::*;
