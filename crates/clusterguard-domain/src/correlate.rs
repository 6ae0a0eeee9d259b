//! Matching raw engine results back to compiled policy skeletons.

use crate::agent::CompiledPolicies;
use crate::metadata::metadata_errors;
use crate::outcome::{RawResult, RuleVerdict, ShapeError};
use crate::result::PolicyEvaluationResult;
use clusterguard_types::{Policy, ProcessingError, ids};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("unidentifiable evaluation result: {0}")]
    Unidentifiable(ShapeError),

    #[error("no compiled policy named {identity}")]
    UnknownPolicy { identity: String },

    #[error("policy was already evaluated by an earlier result")]
    DuplicateResult,

    #[error("evaluation produced no result for this policy")]
    MissingResult,

    #[error("invalid evaluation result: {0}")]
    InvalidShape(ShapeError),
}

impl CorrelationError {
    pub fn code(&self) -> &'static str {
        match self {
            CorrelationError::Unidentifiable(_) => ids::CODE_UNIDENTIFIABLE_RESULT,
            CorrelationError::UnknownPolicy { .. } => ids::CODE_UNKNOWN_POLICY,
            CorrelationError::DuplicateResult => ids::CODE_DUPLICATE_RESULT,
            CorrelationError::MissingResult => ids::CODE_MISSING_RESULT,
            CorrelationError::InvalidShape(_) => ids::CODE_INVALID_RESULT_SHAPE,
        }
    }
}

impl From<CorrelationError> for ProcessingError {
    fn from(err: CorrelationError) -> Self {
        ProcessingError::new(err.code(), err.to_string())
    }
}

/// Correlate every raw result with its policy and classify the outcome.
///
/// Nothing is dropped: unidentifiable results, unknown names, duplicates and policies
/// that never got a result all end up in the errored bucket.
pub fn correlate(results: Vec<RawResult>, compiled: &CompiledPolicies) -> PolicyEvaluationResult {
    let mut out = PolicyEvaluationResult::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for raw in results {
        let policy = correlate_one(raw, compiled, &mut seen);
        if policy.has_processing_errors() {
            for err in &policy.processing_errors {
                warn!(policy = %policy.name, code = %err.code, "{}", err.message);
            }
        }
        out.add_policy(policy);
    }

    for skeleton in compiled.policies() {
        if !seen.contains(&skeleton.name) {
            warn!(policy = %skeleton.name, "no evaluation result for policy");
            out.add_policy(with_error(skeleton.clone(), CorrelationError::MissingResult));
        }
    }

    out
}

fn correlate_one(raw: RawResult, compiled: &CompiledPolicies, seen: &mut BTreeSet<String>) -> Policy {
    let bound = match raw.bind() {
        Ok(bound) => bound,
        Err(err) => return with_error(Policy::default(), CorrelationError::Unidentifiable(err)),
    };
    let identity = compiled.namespace().qualify(&bound.name);
    debug!(name = %bound.name, policy = %identity, "correlating evaluation result");

    let Some(skeleton) = compiled.policy(&identity) else {
        if let Some(incomplete) = compiled.incomplete_policy(&identity) {
            if !seen.insert(identity) {
                return with_error(incomplete.clone(), CorrelationError::DuplicateResult);
            }
            return with_metadata_errors(incomplete.clone());
        }
        let policy = Policy {
            name: identity.clone(),
            ..Policy::default()
        };
        return with_error(policy, CorrelationError::UnknownPolicy { identity });
    };

    if !seen.insert(identity) {
        return with_error(skeleton.clone(), CorrelationError::DuplicateResult);
    }

    let mut policy = skeleton.clone();
    match RuleVerdict::from_value(&bound.value) {
        Ok(verdict) => {
            policy.valid = Some(verdict.valid);
            policy.violations = verdict.violations;
        }
        Err(err) => policy
            .processing_errors
            .push(CorrelationError::InvalidShape(err).into()),
    }
    policy
}

fn with_error(mut policy: Policy, err: CorrelationError) -> Policy {
    policy.processing_errors.push(err.into());
    policy
}

fn with_metadata_errors(mut policy: Policy) -> Policy {
    let errors = metadata_errors(&policy)
        .into_iter()
        .map(|err| ProcessingError::new(ids::CODE_METADATA_INCOMPLETE, err.to_string()));
    policy.processing_errors.extend(errors);
    policy
}
