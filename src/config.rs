use std::path::Path;

use serde::{Deserialize, Serialize};

/// How a listing query is matched against root-relative file paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Query may occur anywhere in the relative path
    #[default]
    Substring,
    /// Relative path must start with the query
    Prefix,
}

impl MatchMode {
    /// Check whether `relative` is selected by `query` under this mode.
    pub fn matches(self, relative: &str, query: &str) -> bool {
        match self {
            MatchMode::Substring => relative.contains(query),
            MatchMode::Prefix => relative.starts_with(query),
        }
    }
}

/// File host configuration
///
/// Built once at startup and shared read-only with every handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing match semantics
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Leave files whose relative path starts with `.` out of listings
    #[serde(default)]
    pub exclude_hidden: bool,

    /// Maximum upload size in bytes (unlimited when unset)
    #[serde(default)]
    pub max_upload_size: Option<u64>,
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check whether a root-relative path belongs in a listing for `query`.
    pub fn is_listed(&self, relative: &str, query: &str) -> bool {
        if self.exclude_hidden && relative.starts_with('.') {
            return false;
        }
        self.match_mode.matches(relative, query)
    }
}
