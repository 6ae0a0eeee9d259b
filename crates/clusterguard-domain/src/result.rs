use clusterguard_types::Policy;
use std::collections::{BTreeMap, BTreeSet};

/// Policies of one evaluation run, partitioned into valid, violated and errored.
///
/// Valid and violated policies are grouped by their `group` field; errored policies are
/// kept in arrival order without grouping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyEvaluationResult {
    valid: BTreeMap<String, Vec<Policy>>,
    violated: BTreeMap<String, Vec<Policy>>,
    errored: Vec<Policy>,
}

impl PolicyEvaluationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a completed policy.
    ///
    /// Processing errors win over any parsed verdict.
    pub fn add_policy(&mut self, policy: Policy) {
        if policy.has_processing_errors() {
            self.errored.push(policy);
            return;
        }
        let bucket = if policy.valid == Some(true) {
            &mut self.valid
        } else {
            &mut self.violated
        };
        bucket.entry(policy.group.clone()).or_default().push(policy);
    }

    /// Distinct group keys of valid and violated policies, sorted.
    pub fn groups(&self) -> Vec<&str> {
        self.valid
            .keys()
            .chain(self.violated.keys())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn valid(&self, group: &str) -> &[Policy] {
        self.valid.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn violated(&self, group: &str) -> &[Policy] {
        self.violated.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn errored(&self) -> &[Policy] {
        &self.errored
    }

    pub fn valid_count(&self) -> usize {
        self.valid.values().map(Vec::len).sum()
    }

    pub fn violated_count(&self) -> usize {
        self.violated.values().map(Vec::len).sum()
    }

    pub fn errored_count(&self) -> usize {
        self.errored.len()
    }

    pub fn total(&self) -> usize {
        self.valid_count() + self.violated_count() + self.errored_count()
    }
}
