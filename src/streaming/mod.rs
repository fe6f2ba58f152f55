//! Streaming module for incremental body classification
//!
//! This module provides streaming primitives that:
//! - Accumulate body chunks as they arrive
//! - Re-classify after every chunk
//! - Signal as soon as the answer is final so inspection can stop

pub mod classifier;
pub mod inspector;

pub use classifier::{StreamDecision, StreamState, StreamingClassifier};
pub use inspector::{InspectionOutcome, ResponseInspector, ResponsePlan};
