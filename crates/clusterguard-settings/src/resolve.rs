use crate::model::ClusterguardConfigV1;
use anyhow::Context;
use clusterguard_types::ids;
use globset::Glob;

/// Which verdict makes the run fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailOn {
    /// Only violated policies fail the run.
    #[default]
    Violation,
    /// Errored policies and metadata diagnostics fail it too.
    Warning,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub namespace: Option<String>,
    pub fail_on: Option<String>,
    pub log_level: Option<String>,
    /// Replaces the configured `[[policies]]` when non-empty.
    pub policy_dirs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub namespace: String,
    pub fail_on: FailOn,
    pub log_level: LogLevel,
    pub policy_dirs: Vec<String>,
    pub exclude: Vec<String>,
}

pub fn resolve_config(
    cfg: ClusterguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let log_level = resolve_log_level(&cfg, &overrides)?;

    let namespace = overrides
        .namespace
        .or(cfg.namespace)
        .unwrap_or_else(|| ids::DEFAULT_NAMESPACE.to_string());
    let namespace = parse_namespace(&namespace)?;

    let fail_on = match overrides.fail_on.or(cfg.fail_on) {
        Some(v) => parse_fail_on(&v)?,
        None => FailOn::default(),
    };

    let policy_dirs = if overrides.policy_dirs.is_empty() {
        cfg.policies.into_iter().map(|p| p.local).collect()
    } else {
        overrides.policy_dirs
    };
    if policy_dirs.is_empty() {
        anyhow::bail!("no policy directories configured (use [[policies]] or --policy-dir)");
    }
    if let Some(empty) = policy_dirs.iter().position(|d| d.trim().is_empty()) {
        anyhow::bail!("policy directory #{} is empty", empty + 1);
    }

    validate_excludes(&cfg.exclude)?;

    Ok(ResolvedConfig {
        namespace,
        fail_on,
        log_level,
        policy_dirs,
        exclude: cfg.exclude,
    })
}

/// Effective log level alone: commands that never resolve policy directories still need it.
pub fn resolve_log_level(
    cfg: &ClusterguardConfigV1,
    overrides: &Overrides,
) -> anyhow::Result<LogLevel> {
    match overrides.log_level.as_deref().or(cfg.log_level.as_deref()) {
        Some(v) => parse_log_level(v),
        None => Ok(LogLevel::default()),
    }
}

fn validate_excludes(patterns: &[String]) -> anyhow::Result<()> {
    for pattern in patterns {
        Glob::new(pattern).with_context(|| format!("invalid exclude glob: {pattern}"))?;
    }
    Ok(())
}

/// Dotted package path; a leading `data.` is accepted and dropped.
fn parse_namespace(v: &str) -> anyhow::Result<String> {
    let v = v.trim();
    let v = v.strip_prefix("data.").unwrap_or(v);
    let valid_segment = |s: &str| {
        let mut chars = s.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if v.is_empty() || !v.split('.').all(valid_segment) {
        anyhow::bail!("invalid namespace: {v:?} (expected a dotted package path like cluster.policy)");
    }
    Ok(v.to_string())
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "violation" | "error" => Ok(FailOn::Violation),
        "warning" | "warn" => Ok(FailOn::Warning),
        other => anyhow::bail!("unknown fail_on: {other} (expected violation|warning)"),
    }
}

fn parse_log_level(v: &str) -> anyhow::Result<LogLevel> {
    match v.to_ascii_lowercase().as_str() {
        "off" => Ok(LogLevel::Off),
        "error" => Ok(LogLevel::Error),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "trace" => Ok(LogLevel::Trace),
        other => anyhow::bail!("unknown log_level: {other} (expected off|error|warn|info|debug|trace)"),
    }
}
