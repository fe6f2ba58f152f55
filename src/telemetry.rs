//! Telemetry Module for the WebP quality filter
//!
//! In Wasm, we emit structured logs that can be collected by
//! Envoy's access logging or external collectors.

use log::{debug, info, warn};
use serde::Serialize;

use crate::webp::{ClassificationResult, Subtype};

/// How a result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Final result reached while streaming
    Stream,
    /// Stream ended (or hit the inspection limit) before a final result
    EndOfStream,
    /// Served from the result cache
    Cache,
}

/// Classification event for logging
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationEvent {
    pub subtype: Subtype,
    /// RIFF chunk code of WebP results, e.g. "VP8L"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fourcc: Option<&'static str>,
    /// -1 unknown, 101 lossless, else 0-100
    pub quality: i32,
    pub source: ResultSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_inspected: Option<usize>,
    /// First time this filter saw the subtype
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub new_subtype: bool,
    pub description: String,
}

impl ClassificationEvent {
    pub fn new(result: &ClassificationResult, source: ResultSource) -> Self {
        Self {
            subtype: result.subtype,
            fourcc: result.subtype.fourcc(),
            quality: result.quality.code(),
            source,
            resource: None,
            context_id: None,
            bytes_inspected: None,
            new_subtype: false,
            description: result.describe(),
        }
    }

    pub fn with_resource(mut self, resource: &str) -> Self {
        self.resource = Some(resource.to_string());
        self
    }

    pub fn with_context_id(mut self, context_id: u32) -> Self {
        self.context_id = Some(context_id);
        self
    }

    pub fn with_bytes_inspected(mut self, bytes: usize) -> Self {
        self.bytes_inspected = Some(bytes);
        self
    }

    pub fn with_new_subtype(mut self, new_subtype: bool) -> Self {
        self.new_subtype = new_subtype;
        self
    }

    /// Log the event
    ///
    /// WebP hits with a known quality go to info, everything else to debug.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => {
                let resolved = self.subtype.is_webp() && self.quality >= 0;
                if resolved {
                    info!("[WEBP-QUALITY] {}", json);
                } else {
                    debug!("[WEBP-QUALITY] {}", json);
                }
            }
            Err(e) => {
                warn!("Failed to serialize classification event: {}", e);
            }
        }
    }
}
