use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `clusterguard.toml` schema v1.
///
/// This is a *user-facing* config model: it is intentionally permissive so forward-compat is easy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterguardConfigV1 {
    /// Optional schema string for tooling (`clusterguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Package prefix of policy modules (`cluster.policy` by default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// When to fail the check: `violation` (default) or `warning`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Directories holding rule files.
    #[serde(default)]
    pub policies: Vec<PolicySource>,

    /// Globs (relative to each policy directory) of rule files to ignore.
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicySource {
    /// Local directory, relative to the working directory.
    pub local: String,
}
