//! Session configuration.
//!
//! Values come from command-line flags first, then the environment
//! (`HBNB_FILE_PATH`, `HBNB_PROMPT`, `HBNB_LOG`), then built-in defaults.

use std::path::PathBuf;

pub const DEFAULT_FILE_PATH: &str = "file.json";
pub const DEFAULT_PROMPT: &str = "(hbnb) ";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON file backing the object store.
    pub file_path: PathBuf,
    /// Prompt shown by the interactive loop.
    pub prompt: String,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            prompt: DEFAULT_PROMPT.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup; unset or empty
    /// variables fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            file_path: get("HBNB_FILE_PATH").map(PathBuf::from).unwrap_or(defaults.file_path),
            prompt: get("HBNB_PROMPT").unwrap_or(defaults.prompt),
            log_filter: get("HBNB_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Applies command-line overrides.
    pub fn with_file_path(mut self, file_path: Option<PathBuf>) -> Self {
        if let Some(path) = file_path {
            self.file_path = path;
        }
        self
    }
}
