//! Policy metadata: METADATA annotation parsing and policy skeleton extraction.
//!
//! A policy documents itself with a YAML block in comments above its package:
//!
//! ```text
//! # METADATA
//! # title: Control plane logging
//! # description: Clusters ship control plane logs
//! # custom:
//! #   group: Security
//! package cluster.policy.logging
//! ```

use crate::compiler::{Module, ModuleSet};
use crate::namespace::PolicyNamespace;
use clusterguard_types::{MetadataField, Policy, RulePath};
use serde::Deserialize;
use tracing::{debug, warn};

const MARKER: &str = "METADATA";

/// Package-level annotations. Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub title: Option<String>,
    pub description: Option<String>,
    pub custom: Option<CustomAnnotations>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CustomAnnotations {
    pub group: Option<String>,
}

/// A required documentation field missing from a policy.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("policy {policy} ({file}): missing metadata field \"{field}\"")]
pub struct MetadataError {
    pub policy: String,
    pub file: RulePath,
    pub field: MetadataField,
}

/// Outcome of walking a module set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Policies with complete metadata; the only ones eligible for evaluation.
    pub policies: Vec<Policy>,
    /// Policies excluded from evaluation because of metadata errors.
    pub incomplete: Vec<Policy>,
    pub errors: Vec<MetadataError>,
}

/// Build policy skeletons for every policy module in `modules`.
///
/// Modules outside the namespace and test modules are skipped silently.
pub fn extract(modules: &ModuleSet, namespace: &PolicyNamespace) -> Extraction {
    let mut out = Extraction::default();

    for module in modules.iter() {
        if !module.is_policy(namespace) {
            debug!(path = %module.path, package = %module.package, "skipping non-policy module");
            continue;
        }

        let policy = policy_from_module(module);
        let errors = metadata_errors(&policy);
        if errors.is_empty() {
            out.policies.push(policy);
            continue;
        }

        for err in &errors {
            warn!(policy = %err.policy, field = %err.field, "policy metadata incomplete");
        }
        out.errors.extend(errors);
        out.incomplete.push(policy);
    }

    out
}

pub fn policy_from_module(module: &Module) -> Policy {
    let annotations = module.annotations.clone().unwrap_or_default();
    Policy {
        name: module.package.clone(),
        file: module.path.clone(),
        title: annotations.title.unwrap_or_default(),
        description: annotations.description.unwrap_or_default(),
        group: annotations
            .custom
            .and_then(|c| c.group)
            .unwrap_or_default(),
        ..Policy::default()
    }
}

/// One diagnostic per empty required field (title, description, group).
pub fn metadata_errors(policy: &Policy) -> Vec<MetadataError> {
    policy
        .missing_metadata()
        .into_iter()
        .map(|field| MetadataError {
            policy: policy.name.clone(),
            file: policy.file.clone(),
            field,
        })
        .collect()
}

/// Parse the package-level METADATA block of `source`.
///
/// Returns `Ok(None)` when the source carries no block and an error message when the
/// block is not valid YAML for the annotation shape.
pub fn parse_annotations(source: &str) -> Result<Option<Annotations>, String> {
    let Some(body) = package_block(source) else {
        return Ok(None);
    };
    if body.trim().is_empty() {
        return Ok(Some(Annotations::default()));
    }
    serde_yaml::from_str::<Annotations>(&body)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Pick the block that belongs to the package: the last one above the package
/// declaration, else the first one below it.
fn package_block(source: &str) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let package_line = lines.iter().position(|l| {
        l.split('#')
            .next()
            .unwrap_or_default()
            .trim()
            .strip_prefix("package")
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    });
    let blocks = comment_blocks(&lines);

    let chosen = match package_line {
        Some(pkg) => blocks
            .iter()
            .rev()
            .find(|(start, _)| *start < pkg)
            .or_else(|| blocks.iter().find(|(start, _)| *start > pkg)),
        None => blocks.first(),
    };
    chosen.map(|(_, body)| body.clone())
}

/// All METADATA blocks as `(marker line index, yaml body)`.
fn comment_blocks(lines: &[&str]) -> Vec<(usize, String)> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !is_marker(lines[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut body: Vec<&str> = Vec::new();
        i += 1;
        while i < lines.len() && !is_marker(lines[i]) {
            let Some(rest) = lines[i].trim_start().strip_prefix('#') else {
                break;
            };
            body.push(rest.strip_prefix(' ').unwrap_or(rest));
            i += 1;
        }
        blocks.push((start, body.join("\n")));
    }
    blocks
}

fn is_marker(line: &str) -> bool {
    line.trim()
        .strip_prefix('#')
        .is_some_and(|rest| rest.trim() == MARKER)
}
