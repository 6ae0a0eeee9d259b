//! Pure policy pipeline (no IO).
//!
//! Input: rule files loaded elsewhere, plus an input document.
//! Output: policies classified into valid, violated and errored buckets.
//!
//! Rule evaluation itself is delegated to a [`RuleEngine`] implementation.

#![forbid(unsafe_code)]

pub mod agent;
pub mod compiler;
pub mod correlate;
pub mod engine;
pub mod metadata;
pub mod namespace;
pub mod outcome;
pub mod result;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use agent::{AgentError, CompiledPolicies, PolicyAgent, evaluate};
pub use compiler::{CompileError, Module, ModuleSet, compile};
pub use correlate::{CorrelationError, correlate};
pub use engine::{EngineError, RuleEngine};
pub use metadata::{Annotations, Extraction, MetadataError, extract, metadata_errors};
pub use namespace::PolicyNamespace;
pub use outcome::{RawExpression, RawResult, RuleVerdict, ShapeError};
pub use result::PolicyEvaluationResult;

/// Fuzz-friendly API for parsing robustness without an engine.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    /// Parse the METADATA annotation block of arbitrary rule source text.
    pub fn parse_annotations(source: &str) -> Result<(), String> {
        crate::metadata::parse_annotations(source).map(|_| ())
    }

    /// Parse an arbitrary JSON document as a rule verdict.
    pub fn parse_verdict(text: &str) -> Result<(), String> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        crate::outcome::RuleVerdict::from_value(&value)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
