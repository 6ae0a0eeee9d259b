//! The policy agent: compile once, evaluate many.

use crate::compiler::{self, CompileError, ModuleSet};
use crate::correlate::correlate;
use crate::engine::{EngineError, RuleEngine};
use crate::metadata::{self, Extraction, MetadataError};
use crate::namespace::PolicyNamespace;
use crate::result::PolicyEvaluationResult;
use clusterguard_types::{Policy, RuleFile};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable snapshot of one successful compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledPolicies {
    namespace: PolicyNamespace,
    modules: ModuleSet,
    evaluation: ModuleSet,
    policies: BTreeMap<String, Policy>,
    incomplete: BTreeMap<String, Policy>,
    metadata_errors: Vec<MetadataError>,
}

impl CompiledPolicies {
    pub fn new(namespace: PolicyNamespace, modules: ModuleSet) -> Self {
        let extraction = metadata::extract(&modules, &namespace);
        Self::from_extraction(namespace, modules, extraction)
    }

    pub fn from_extraction(
        namespace: PolicyNamespace,
        modules: ModuleSet,
        extraction: Extraction,
    ) -> Self {
        let by_name = |policies: Vec<Policy>| {
            policies
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect::<BTreeMap<_, _>>()
        };
        let incomplete = by_name(extraction.incomplete);
        let evaluation = modules
            .filtered(|m| !(m.is_policy(&namespace) && incomplete.contains_key(&m.package)));
        Self {
            namespace,
            modules,
            evaluation,
            policies: by_name(extraction.policies),
            incomplete,
            metadata_errors: extraction.errors,
        }
    }

    pub fn namespace(&self) -> &PolicyNamespace {
        &self.namespace
    }

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Modules handed to the engine: policies with incomplete metadata are left out.
    pub fn evaluation_modules(&self) -> &ModuleSet {
        &self.evaluation
    }

    /// Evaluable policy skeletons, ordered by identity.
    pub fn policies(&self) -> impl Iterator<Item = &Policy> {
        self.policies.values()
    }

    pub fn policy(&self, identity: &str) -> Option<&Policy> {
        self.policies.get(identity)
    }

    pub fn incomplete_policy(&self, identity: &str) -> Option<&Policy> {
        self.incomplete.get(identity)
    }

    pub fn incomplete_policies(&self) -> impl Iterator<Item = &Policy> {
        self.incomplete.values()
    }

    pub fn metadata_errors(&self) -> &[MetadataError] {
        &self.metadata_errors
    }

    /// Number of evaluable policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// The extraction this snapshot was built from.
    pub fn extraction(&self) -> Extraction {
        Extraction {
            policies: self.policies.values().cloned().collect(),
            incomplete: self.incomplete.values().cloned().collect(),
            errors: self.metadata_errors.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("no policies compiled")]
    NotCompiled,

    #[error("failed to compile policies: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Owns the engine and the current compiled snapshot.
///
/// `compile` needs `&mut self`; evaluation only borrows the snapshot, so one snapshot
/// can be evaluated from several threads through [`PolicyAgent::snapshot`].
pub struct PolicyAgent<E: RuleEngine> {
    engine: E,
    namespace: PolicyNamespace,
    compiled: Option<Arc<CompiledPolicies>>,
}

impl<E: RuleEngine> PolicyAgent<E> {
    pub fn new(engine: E, namespace: PolicyNamespace) -> Self {
        Self {
            engine,
            namespace,
            compiled: None,
        }
    }

    pub fn namespace(&self) -> &PolicyNamespace {
        &self.namespace
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Replace the compiled snapshot with one built from `files`.
    ///
    /// The previous snapshot is discarded even when compilation fails.
    pub fn compile(&mut self, files: &[RuleFile]) -> Result<Arc<CompiledPolicies>, AgentError> {
        self.compiled = None;
        let modules = compiler::compile(files, &self.engine, &self.namespace)?;
        let compiled = Arc::new(CompiledPolicies::new(self.namespace.clone(), modules));
        debug!(
            modules = compiled.modules().len(),
            policies = compiled.len(),
            incomplete = compiled.incomplete_policies().count(),
            "compiled rule files"
        );
        self.compiled = Some(Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Policies and metadata diagnostics of the current snapshot.
    pub fn extract(&self) -> Result<Extraction, AgentError> {
        Ok(self.snapshot()?.extraction())
    }

    /// Compile `files` and return the resulting extraction.
    pub fn with_files(&mut self, files: &[RuleFile]) -> Result<Extraction, AgentError> {
        Ok(self.compile(files)?.extraction())
    }

    pub fn snapshot(&self) -> Result<Arc<CompiledPolicies>, AgentError> {
        self.compiled.clone().ok_or(AgentError::NotCompiled)
    }

    pub fn evaluate(&self, input: &JsonValue) -> Result<PolicyEvaluationResult, AgentError> {
        let compiled = self.snapshot()?;
        Ok(evaluate(&compiled, &self.engine, input)?)
    }
}

/// Run `compiled` against `input` and classify every outcome.
pub fn evaluate<E: RuleEngine + ?Sized>(
    compiled: &CompiledPolicies,
    engine: &E,
    input: &JsonValue,
) -> Result<PolicyEvaluationResult, EngineError> {
    let raw = engine.evaluate(compiled.evaluation_modules(), input)?;
    debug!(outcomes = raw.len(), "engine returned outcomes");

    let result = correlate(raw, compiled);
    info!(
        valid = result.valid_count(),
        violated = result.violated_count(),
        errored = result.errored_count(),
        "evaluated policies"
    );
    Ok(result)
}
