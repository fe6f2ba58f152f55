//! Response Inspector
//!
//! Host-independent half of the HTTP filter: decides whether a response
//! is inspected at all, feeds its body chunks to a `StreamingClassifier`
//! and applies the inspection limit.

use log::debug;

use crate::cache::ResultCache;
use crate::config::FilterConfig;
use crate::streaming::{StreamDecision, StreamingClassifier};
use crate::telemetry::ResultSource;
use crate::webp::ClassificationResult;

/// What to do with a response once its headers are known
pub enum ResponsePlan {
    /// Filter disabled or nothing to inspect
    Pass,
    /// Result already known for this resource; skip the body
    Cached(ClassificationResult),
    /// Stream the body through an inspector
    Inspect(ResponseInspector),
}

impl ResponsePlan {
    pub fn for_response(
        config: &FilterConfig,
        cache: &ResultCache,
        resource: Option<&str>,
        end_of_stream: bool,
    ) -> Self {
        if !config.enabled {
            return ResponsePlan::Pass;
        }
        if let Some(result) = resource.and_then(|r| cache.get(r)) {
            return ResponsePlan::Cached(result);
        }
        if end_of_stream {
            return ResponsePlan::Pass;
        }
        ResponsePlan::Inspect(ResponseInspector::new(config.max_inspect_bytes))
    }
}

/// A result leaving the inspector, with how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectionOutcome {
    pub result: ClassificationResult,
    pub source: ResultSource,
}

/// Per-response body inspection
pub struct ResponseInspector {
    classifier: StreamingClassifier,
    /// Buffered bytes after which the stream is closed without a final answer
    max_inspect_bytes: usize,
}

impl ResponseInspector {
    pub fn new(max_inspect_bytes: usize) -> Self {
        Self {
            classifier: StreamingClassifier::new(),
            max_inspect_bytes,
        }
    }

    /// Hand over one body chunk
    ///
    /// Returns the outcome the first time one is available; afterwards
    /// chunks are ignored and `None` is returned.
    pub fn on_chunk(&mut self, chunk: &[u8], end_of_stream: bool) -> Option<InspectionOutcome> {
        match self.classifier.feed(chunk) {
            StreamDecision::Finalized(result) => Some(InspectionOutcome {
                result,
                source: ResultSource::Stream,
            }),
            StreamDecision::Continue if end_of_stream => self.close(),
            StreamDecision::Continue => {
                if self.classifier.buffered_bytes() > self.max_inspect_bytes {
                    debug!(
                        "No answer within {} bytes, giving up",
                        self.max_inspect_bytes
                    );
                    self.close()
                } else {
                    None
                }
            }
            StreamDecision::Done => None,
        }
    }

    /// Take the best-effort result of a stream that gets no more bytes
    pub fn close(&mut self) -> Option<InspectionOutcome> {
        match self.classifier.end_of_stream() {
            StreamDecision::Finalized(result) => Some(InspectionOutcome {
                result,
                source: ResultSource::EndOfStream,
            }),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.classifier.is_finalized()
    }

    pub fn bytes_inspected(&self) -> usize {
        self.classifier.total_bytes()
    }

    pub fn chunks_inspected(&self) -> usize {
        self.classifier.chunks_seen()
    }
}
