use crate::{MetadataField, Policy, RulePath};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stable schema identifier for clusterguard reports.
pub const SCHEMA_REPORT_V1: &str = "clusterguard.report.v1";

/// Overall outcome of a check run. Maps cleanly to CI signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportSummary {
    pub valid: u32,
    pub violated: u32,
    pub errored: u32,
    pub metadata_errors: u32,
}

/// Policies of one group, split by verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupReport {
    pub name: String,
    #[serde(default)]
    pub valid: Vec<Policy>,
    #[serde(default)]
    pub violated: Vec<Policy>,
}

/// A policy excluded from evaluation because a required metadata field is missing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MetadataDiagnostic {
    pub policy: String,
    pub file: RulePath,
    pub field: MetadataField,
    pub message: String,
}

/// The report envelope written by `clusterguard check`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterguardReport {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub verdict: Verdict,
    pub summary: ReportSummary,
    #[serde(default)]
    pub groups: Vec<GroupReport>,
    #[serde(default)]
    pub errored: Vec<Policy>,
    #[serde(default)]
    pub metadata_errors: Vec<MetadataDiagnostic>,
}
