//! WebP Quality Wasm Filter for Envoy Proxy
//!
//! This filter watches upstream response bodies as they stream through
//! the proxy, detects WebP images and estimates the encoder quality of
//! lossy ones from the frame header. Inspection stops as soon as the
//! answer is known; the body itself is never modified.
//!
//! Targets: wasm32-wasi (Envoy proxy-wasm ABI)

pub mod cache;
pub mod config;
pub mod streaming;
pub mod summary;
pub mod telemetry;
pub mod webp;

use log::{debug, info, warn};
use proxy_wasm::traits::{Context, HttpContext, RootContext};
use proxy_wasm::types::{Action, ContextType, LogLevel};
use std::cell::RefCell;

use crate::cache::ResultCache;
use crate::config::FilterConfig;
use crate::streaming::{InspectionOutcome, ResponseInspector, ResponsePlan};
use crate::summary::SubtypeSummary;
use crate::telemetry::{ClassificationEvent, ResultSource};
use crate::webp::ClassificationResult;

/// Response header carrying the subtype label on cache hits
pub const HEADER_WEBP_TYPE: &str = "x-webp-type";
/// Response header carrying the quality code on cache hits
pub const HEADER_WEBP_QUALITY: &str = "x-webp-quality";

// Thread-local storage shared by the root context and its HTTP contexts
thread_local! {
    static CONFIG: RefCell<FilterConfig> = RefCell::new(FilterConfig::default());
    static CACHE: RefCell<ResultCache> =
        RefCell::new(ResultCache::new(FilterConfig::default().cache_max_entries));
    static SUMMARY: RefCell<SubtypeSummary> = RefCell::new(SubtypeSummary::new());
}

/// Root context for filter lifecycle management
struct WebpRootContext {
    config: FilterConfig,
}

impl WebpRootContext {
    fn new() -> Self {
        Self {
            config: FilterConfig::default(),
        }
    }
}

impl Context for WebpRootContext {}

impl RootContext for WebpRootContext {
    fn on_configure(&mut self, _plugin_configuration_size: usize) -> bool {
        if let Some(config_bytes) = self.get_plugin_configuration() {
            match FilterConfig::from_bytes(&config_bytes) {
                Ok(config) => self.config = config,
                Err(e) => {
                    // Keep defaults
                    warn!("Ignoring plugin configuration: {}", e);
                }
            }
        }

        CONFIG.with(|c| {
            *c.borrow_mut() = self.config.clone();
        });
        CACHE.with(|c| c.borrow_mut().set_max_entries(self.config.cache_max_entries));

        info!(
            "WebP quality filter initialized (enabled={}, max_inspect_bytes={}, cache_max_entries={})",
            self.config.enabled, self.config.max_inspect_bytes, self.config.cache_max_entries
        );

        true
    }

    fn create_http_context(&self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(WebpHttpContext::new(context_id)))
    }

    fn get_type(&self) -> Option<ContextType> {
        Some(ContextType::HttpContext)
    }
}

/// HTTP context for per-response classification
struct WebpHttpContext {
    context_id: u32,
    /// `:authority` + `:path` of the request, used as the cache key
    resource: Option<String>,
    /// Present while the response body is being inspected
    inspector: Option<ResponseInspector>,
    /// Configuration snapshot for this request
    config: FilterConfig,
}

impl WebpHttpContext {
    fn new(context_id: u32) -> Self {
        let config = CONFIG.with(|c| c.borrow().clone());

        Self {
            context_id,
            resource: None,
            inspector: None,
            config,
        }
    }

    /// Cache, summarize and log a result leaving the inspector
    fn record(&mut self, outcome: InspectionOutcome) {
        let InspectionOutcome { result, source } = outcome;
        let (bytes_inspected, chunks_inspected) = self
            .inspector
            .as_ref()
            .map(|i| (i.bytes_inspected(), i.chunks_inspected()))
            .unwrap_or((0, 0));

        if let Some(resource) = self.resource.as_deref() {
            CACHE.with(|c| c.borrow_mut().record(resource, result));
        }

        let new_subtype = SUMMARY.with(|s| s.borrow_mut().record(result.subtype));
        if new_subtype && self.config.log_type_summary {
            let summary = SUMMARY.with(|s| s.borrow().describe());
            info!("WebP subtypes seen so far: {}", summary);
        }

        debug!(
            "[context_id={}] {} after {} bytes in {} chunks",
            self.context_id,
            result.describe(),
            bytes_inspected,
            chunks_inspected
        );

        if self.config.log_results {
            let mut event = ClassificationEvent::new(&result, source)
                .with_context_id(self.context_id)
                .with_bytes_inspected(bytes_inspected)
                .with_new_subtype(new_subtype);
            if let Some(resource) = self.resource.as_deref() {
                event = event.with_resource(resource);
            }
            event.emit();
        }
    }

    fn serve_cached(&self, result: &ClassificationResult) {
        debug!(
            "[context_id={}] Cache hit: {}",
            self.context_id,
            result.describe()
        );

        if self.config.annotate_response_headers && result.subtype.is_webp() {
            let quality = result.quality.code().to_string();
            self.set_http_response_header(HEADER_WEBP_TYPE, Some(result.subtype.label()));
            self.set_http_response_header(HEADER_WEBP_QUALITY, Some(&quality));
        }

        if self.config.log_results {
            let mut event =
                ClassificationEvent::new(result, ResultSource::Cache).with_context_id(self.context_id);
            if let Some(resource) = self.resource.as_deref() {
                event = event.with_resource(resource);
            }
            event.emit();
        }
    }
}

impl Context for WebpHttpContext {}

impl HttpContext for WebpHttpContext {
    fn on_http_request_headers(&mut self, _num_headers: usize, _end_of_stream: bool) -> Action {
        let authority = self.get_http_request_header(":authority");
        let path = self.get_http_request_header(":path");

        self.resource = match (authority, path) {
            (Some(authority), Some(path)) => Some(format!("{}{}", authority, path)),
            (None, Some(path)) => Some(path),
            _ => None,
        };

        debug!(
            "[context_id={}] Request for {:?}",
            self.context_id, self.resource
        );

        Action::Continue
    }

    fn on_http_response_headers(&mut self, _num_headers: usize, end_of_stream: bool) -> Action {
        let plan = CACHE.with(|c| {
            ResponsePlan::for_response(
                &self.config,
                &c.borrow(),
                self.resource.as_deref(),
                end_of_stream,
            )
        });

        match plan {
            ResponsePlan::Pass => {}
            ResponsePlan::Cached(result) => self.serve_cached(&result),
            ResponsePlan::Inspect(inspector) => self.inspector = Some(inspector),
        }

        Action::Continue
    }

    fn on_http_response_body(&mut self, body_size: usize, end_of_stream: bool) -> Action {
        // No inspector, or result already known - let the body pass untouched
        match self.inspector.as_ref() {
            Some(inspector) if !inspector.is_done() => {}
            _ => return Action::Continue,
        }

        let chunk = self.get_http_response_body(0, body_size).unwrap_or_default();
        let outcome = self
            .inspector
            .as_mut()
            .and_then(|i| i.on_chunk(&chunk, end_of_stream));

        if let Some(outcome) = outcome {
            self.record(outcome);
        }

        Action::Continue
    }

    fn on_log(&mut self) {
        // Streams reset or truncated before end_of_stream still report
        let outcome = self.inspector.as_mut().and_then(|i| i.close());
        if let Some(outcome) = outcome {
            self.record(outcome);
        }
    }
}

// Register the filter with proxy-wasm runtime
proxy_wasm::main! {{
    proxy_wasm::set_log_level(LogLevel::Info);
    proxy_wasm::set_root_context(|_| -> Box<dyn RootContext> {
        Box::new(WebpRootContext::new())
    });
}}
