//! Configuration module for the WebP quality filter
//!
//! Configuration is loaded from Envoy plugin configuration,
//! NOT from external files. This avoids file I/O in the Wasm sandbox.

use serde::Deserialize;
use thiserror::Error;

/// Filter configuration loaded from Envoy plugin configuration
#[derive(Clone, Debug, Deserialize)]
pub struct FilterConfig {
    /// Master switch; a disabled filter passes responses untouched
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Add x-webp-* headers when a cached result is known up front
    #[serde(default = "default_annotate_response_headers")]
    pub annotate_response_headers: bool,

    /// Give up on a stream after buffering this many bytes
    #[serde(default = "default_max_inspect_bytes")]
    pub max_inspect_bytes: usize,

    /// Result cache is flushed once it grows past this many entries
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Emit a structured event per classified response
    #[serde(default = "default_log_results")]
    pub log_results: bool,

    /// Log the running set of WebP subtypes whenever a new one shows up
    #[serde(default)]
    pub log_type_summary: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_annotate_response_headers() -> bool {
    true
}

fn default_max_inspect_bytes() -> usize {
    1024 * 1024 // 1MB
}

fn default_cache_max_entries() -> usize {
    20_000
}

fn default_log_results() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            annotate_response_headers: default_annotate_response_headers(),
            max_inspect_bytes: default_max_inspect_bytes(),
            cache_max_entries: default_cache_max_entries(),
            log_results: default_log_results(),
            log_type_summary: false,
        }
    }
}

impl FilterConfig {
    /// Parse configuration from JSON bytes (from Envoy plugin configuration)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str = std::str::from_utf8(bytes)
            .map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;

        serde_json::from_str(config_str)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))
    }
}

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}
