//! Use case orchestration for clusterguard.
//!
//! This crate provides the application layer: use cases that coordinate the source, domain,
//! rule engine, and render layers. It is intentionally thin and delegates heavy lifting to
//! those layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod check;
mod policies;
mod render;
mod report;

pub use check::{CheckInput, CheckOutput, run_check};
pub use policies::{PoliciesInput, PoliciesOutput, format_policies, run_policies};
pub use render::{render_annotations, render_markdown};
pub use report::{
    build_report, parse_report_json, serialize_report, to_renderable, verdict, verdict_exit_code,
};
