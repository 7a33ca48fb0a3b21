use thiserror::Error;

#[derive(Error, Debug)]
pub enum GleanError {
    /// The document is an anti-bot challenge or block page.
    #[error("Challenge page detected (marker: {marker})")]
    ChallengeDetected { marker: String },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GleanError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            GleanError::ChallengeDetected { .. } => Some(
                "The source blocked this request. Rotate the egress identity (proxy, user agent)\nand fetch the document again before re-running extraction"
            ),
            GleanError::TomlError(_) | GleanError::ConfigError(_) => Some(
                "Check your config file, or point GLEAN_CONFIG at a different one"
            ),
            GleanError::IoError(_) => Some(
                "Check that the document path exists, or pass `-` to read from stdin"
            ),
            _ => None,
        }
    }

    /// Whether this error means the caller was blocked rather than a local failure
    pub fn is_challenge(&self) -> bool {
        matches!(self, GleanError::ChallengeDetected { .. })
    }
}

pub type Result<T> = std::result::Result<T, GleanError>;
