//! Stable DTOs and IDs used across the clusterguard workspace.
//!
//! This crate is intentionally boring:
//! - rule files and policy records shared by every layer
//! - stable string codes for processing errors
//! - canonical rule-file path handling
//! - the emitted report envelope

#![forbid(unsafe_code)]

pub mod ids;
pub mod path;
pub mod policy;
pub mod report;

pub use path::RulePath;
pub use policy::{MetadataField, Policy, ProcessingError, RuleFile};
pub use report::{
    ClusterguardReport, GroupReport, MetadataDiagnostic, ReportSummary, SCHEMA_REPORT_V1,
    ToolMeta, Verdict,
};
