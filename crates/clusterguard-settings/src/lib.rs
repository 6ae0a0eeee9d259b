//! Config parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{ClusterguardConfigV1, PolicySource};
pub use resolve::{FailOn, LogLevel, Overrides, ResolvedConfig};

/// Parse `clusterguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ClusterguardConfigV1> {
    let cfg: ClusterguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve only the log level (command-line override, then file value, then `info`).
pub fn resolve_log_level(
    cfg: &ClusterguardConfigV1,
    overrides: &Overrides,
) -> anyhow::Result<LogLevel> {
    resolve::resolve_log_level(cfg, overrides)
}

/// Resolve the effective config (file values, then command-line overrides, then defaults).
pub fn resolve_config(
    cfg: ClusterguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
