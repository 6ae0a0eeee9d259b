//! The `check` use case: evaluate policies against an input document and produce a report.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clusterguard_domain::{PolicyAgent, PolicyNamespace};
use clusterguard_rego::RegoEngine;
use clusterguard_settings::{ClusterguardConfigV1, Overrides, ResolvedConfig};
use clusterguard_types::{ClusterguardReport, RuleFile};
use time::OffsetDateTime;
use tracing::info;

use crate::report::build_report;

/// Input for the check use case.
#[derive(Clone, Debug)]
pub struct CheckInput<'a> {
    /// Directory relative policy directories are resolved against.
    pub base_dir: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Evaluation input document (JSON, or YAML by extension).
    pub input_path: &'a Utf8Path,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    pub report: ClusterguardReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the check use case: resolve config, load and compile rules, evaluate, build report.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    let resolved = load_config(input.config_text, input.overrides.clone())?;
    let files = load_rules(input.base_dir, &resolved)?;
    let document = clusterguard_source::load_input(input.input_path).context("load input")?;

    let namespace = PolicyNamespace::new(&resolved.namespace);
    let mut agent = PolicyAgent::new(RegoEngine::new(&namespace), namespace);
    let compiled = agent.compile(&files).context("compile policies")?;
    let result = agent.evaluate(&document).context("evaluate policies")?;

    let finished_at = OffsetDateTime::now_utc();
    let report = build_report(&result, compiled.metadata_errors(), started_at, finished_at);
    info!(verdict = ?report.verdict, "check finished");

    Ok(CheckOutput {
        report,
        resolved_config: resolved,
    })
}

/// Parse config text (empty is allowed, defaults apply) and resolve it with overrides.
pub(crate) fn load_config(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        ClusterguardConfigV1::default()
    } else {
        clusterguard_settings::parse_config_toml(config_text).context("parse config")?
    };
    clusterguard_settings::resolve_config(cfg, overrides).context("resolve config")
}

pub(crate) fn load_rules(base_dir: &Utf8Path, resolved: &ResolvedConfig) -> anyhow::Result<Vec<RuleFile>> {
    let dirs: Vec<Utf8PathBuf> = resolved
        .policy_dirs
        .iter()
        .map(|d| base_dir.join(d))
        .collect();
    clusterguard_source::load_policy_dirs(&dirs, &resolved.exclude).context("load rule files")
}
