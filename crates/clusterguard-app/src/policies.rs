//! The `policies` use case: compile rules and list what would be evaluated.

use anyhow::Context;
use camino::Utf8Path;
use clusterguard_domain::{PolicyAgent, PolicyNamespace};
use clusterguard_rego::RegoEngine;
use clusterguard_settings::Overrides;
use clusterguard_types::{MetadataDiagnostic, Policy};

use crate::check::{load_config, load_rules};
use crate::report::diagnostic;

#[derive(Clone, Debug)]
pub struct PoliciesInput<'a> {
    pub base_dir: &'a Utf8Path,
    pub config_text: &'a str,
    pub overrides: Overrides,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoliciesOutput {
    /// Evaluable policies, ordered by identity.
    pub policies: Vec<Policy>,
    pub metadata_errors: Vec<MetadataDiagnostic>,
}

pub fn run_policies(input: PoliciesInput<'_>) -> anyhow::Result<PoliciesOutput> {
    let resolved = load_config(input.config_text, input.overrides)?;
    let files = load_rules(input.base_dir, &resolved)?;

    let namespace = PolicyNamespace::new(&resolved.namespace);
    let mut agent = PolicyAgent::new(RegoEngine::new(&namespace), namespace);
    let extraction = agent.with_files(&files).context("compile policies")?;

    Ok(PoliciesOutput {
        policies: extraction.policies,
        metadata_errors: extraction.errors.iter().map(diagnostic).collect(),
    })
}

/// Human-readable listing: one line per policy, then metadata diagnostics.
pub fn format_policies(output: &PoliciesOutput) -> String {
    let mut out = String::new();
    if output.policies.is_empty() {
        out.push_str("No evaluable policies.\n");
    }
    for p in &output.policies {
        out.push_str(&format!("{}  [{}]  {}  ({})\n", p.name, p.group, p.title, p.file));
    }
    if !output.metadata_errors.is_empty() {
        out.push_str("\nMetadata errors:\n");
        for d in &output.metadata_errors {
            out.push_str(&format!("  {} ({}): {}\n", d.policy, d.file, d.message));
        }
    }
    out
}
