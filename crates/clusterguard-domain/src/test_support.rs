use crate::agent::CompiledPolicies;
use crate::compiler::ModuleSet;
use crate::engine::{EngineError, RuleEngine};
use crate::metadata::Extraction;
use crate::namespace::PolicyNamespace;
use crate::outcome::{RawExpression, RawResult};
use clusterguard_types::{Policy, RuleFile, RulePath};
use serde_json::{Map, Value, json};
use std::cell::RefCell;

/// Engine double: accepts every source except the configured paths and replays canned
/// results on evaluation.
#[derive(Default)]
pub struct StubEngine {
    pub reject: Vec<String>,
    pub results: Vec<RawResult>,
    pub seen_input: RefCell<Option<Value>>,
}

impl StubEngine {
    pub fn rejecting(path: &str) -> Self {
        Self {
            reject: vec![path.to_string()],
            ..Self::default()
        }
    }

    pub fn returning(results: Vec<RawResult>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }
}

impl RuleEngine for StubEngine {
    fn validate(&self, file: &RuleFile) -> Result<(), String> {
        if self.reject.iter().any(|p| p == file.path.as_str()) {
            return Err("rego_parse_error: unexpected identifier".to_string());
        }
        Ok(())
    }

    fn evaluate(&self, _modules: &ModuleSet, input: &Value) -> Result<Vec<RawResult>, EngineError> {
        *self.seen_input.borrow_mut() = Some(input.clone());
        Ok(self.results.clone())
    }
}

pub fn rule_file(path: &str, content: &str) -> RuleFile {
    let name = RulePath::new(path)
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string();
    RuleFile::new(name, path, content)
}

/// Rule source with a METADATA header; `None` fields are omitted from the header.
pub fn policy_source(
    package: &str,
    title: Option<&str>,
    description: Option<&str>,
    group: Option<&str>,
) -> String {
    let mut out = String::from("# METADATA\n");
    if let Some(title) = title {
        out.push_str(&format!("# title: {title}\n"));
    }
    if let Some(description) = description {
        out.push_str(&format!("# description: {description}\n"));
    }
    if let Some(group) = group {
        out.push_str(&format!("# custom:\n#   group: {group}\n"));
    }
    out.push_str(&format!("package {package}\n\nvalid := true\n"));
    out
}

pub fn skeleton(name: &str, group: &str) -> Policy {
    Policy {
        name: name.to_string(),
        file: RulePath::new(format!("policies/{}.rego", name.rsplit('.').next().unwrap_or(name))),
        title: format!("{name} title"),
        description: "This is just for test".to_string(),
        group: group.to_string(),
        ..Policy::default()
    }
}

pub fn compiled(namespace: &str, policies: Vec<Policy>, incomplete: Vec<Policy>) -> CompiledPolicies {
    let errors = incomplete.iter().flat_map(crate::metadata::metadata_errors).collect();
    CompiledPolicies::from_extraction(
        PolicyNamespace::new(namespace),
        ModuleSet::default(),
        Extraction {
            policies,
            incomplete,
            errors,
        },
    )
}

pub fn bindings(name: Value) -> Option<Map<String, Value>> {
    let mut map = Map::new();
    map.insert("name".to_string(), name);
    Some(map)
}

/// Well-formed engine outcome bound to `name`.
pub fn outcome(name: &str, value: Value) -> RawResult {
    RawResult {
        expressions: vec![RawExpression::with_value(value)],
        bindings: bindings(json!(name)),
    }
}
