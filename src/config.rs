use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{GleanError, Result};

/// Global glean configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Extraction tuning shared by every pipeline invocation
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Tuning knobs for the extraction pipeline.
///
/// Passed by reference into every entry point; nothing in the pipeline reads
/// configuration from global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Bytes of context kept before an anchor
    #[serde(default = "default_window_before")]
    pub window_before: usize,

    /// Bytes of context kept after an anchor
    #[serde(default = "default_window_after")]
    pub window_after: usize,

    /// Record target used when the caller does not ask for a specific count
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Challenge markers checked in addition to the built-in list
    #[serde(default)]
    pub extra_challenge_markers: Vec<String>,

    /// Hosts never surfaced as external links, in addition to the built-in list
    #[serde(default)]
    pub blocked_hosts: Vec<String>,
}

fn default_window_before() -> usize {
    400
}

fn default_window_after() -> usize {
    1500
}

fn default_limit() -> usize {
    20
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            window_before: default_window_before(),
            window_after: default_window_after(),
            default_limit: default_limit(),
            extra_challenge_markers: Vec::new(),
            blocked_hosts: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.extraction.window_after == 0 {
            return Err(GleanError::ConfigError(
                "extraction.window_after must be greater than zero".into(),
            ));
        }
        Ok(config)
    }

    /// Get the config file path
    ///
    /// Supports GLEAN_CONFIG environment variable for test isolation
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("GLEAN_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "glean")
            .ok_or_else(|| GleanError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
