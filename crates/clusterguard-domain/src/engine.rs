use crate::compiler::ModuleSet;
use crate::outcome::RawResult;
use clusterguard_types::{RuleFile, RulePath};
use serde_json::Value as JsonValue;

/// Boundary to the rule-evaluation engine.
///
/// The pipeline only relies on this contract: syntax checks per rule file, and an
/// evaluation producing one raw result per policy, bound to the policy by `name`.
pub trait RuleEngine {
    /// Check that a single rule source parses. The error is the engine's message.
    fn validate(&self, file: &RuleFile) -> Result<(), String>;

    /// Evaluate the compiled modules against `input`.
    fn evaluate(&self, modules: &ModuleSet, input: &JsonValue)
    -> Result<Vec<RawResult>, EngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load module {path}: {message}")]
    Load { path: RulePath, message: String },

    #[error("invalid evaluation input: {0}")]
    Input(String),

    #[error("failed to evaluate rules: {0}")]
    Eval(String),
}
