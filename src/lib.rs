//! Minimal HTTP file hosting.
//!
//! Serves a directory tree over plain HTTP verbs: `GET` downloads a file or
//! lists matching files, `POST` stores a multipart upload and `DELETE` removes
//! a file or directory. Every request path is resolved against the served
//! root and rejected if it would leave it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod resolve;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::{Config, MatchMode};
pub use error::FileHostError;

/// Per-request view of the served root and its settings
#[derive(Clone)]
pub struct AppState {
    /// Served root, every client path resolves beneath it
    pub root_dir: PathBuf,
    pub config: Arc<Config>,
}

impl AppState {
    /// State for `root_dir`; the config is frozen from here on.
    pub fn with_config(root_dir: PathBuf, config: Config) -> Self {
        Self {
            root_dir,
            config: Arc::new(config),
        }
    }
}
