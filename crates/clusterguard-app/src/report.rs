use anyhow::Context;
use clusterguard_domain::{MetadataError, PolicyEvaluationResult};
use clusterguard_render::{
    RenderableDiagnostic, RenderableError, RenderableGroup, RenderablePolicy, RenderableReport,
    RenderableSummary, RenderableVerdictStatus,
};
use clusterguard_settings::FailOn;
use clusterguard_types::{
    ClusterguardReport, GroupReport, MetadataDiagnostic, Policy, ReportSummary, SCHEMA_REPORT_V1,
    ToolMeta, Verdict,
};
use time::OffsetDateTime;

/// Assemble the report envelope from one evaluation.
pub fn build_report(
    result: &PolicyEvaluationResult,
    metadata_errors: &[MetadataError],
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
) -> ClusterguardReport {
    let groups = result
        .groups()
        .into_iter()
        .map(|name| GroupReport {
            name: name.to_string(),
            valid: by_name(result.valid(name)),
            violated: by_name(result.violated(name)),
        })
        .collect();

    let summary = ReportSummary {
        valid: count(result.valid_count()),
        violated: count(result.violated_count()),
        errored: count(result.errored_count()),
        metadata_errors: count(metadata_errors.len()),
    };

    ClusterguardReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "clusterguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        verdict: verdict(&summary),
        summary,
        groups,
        errored: by_name(result.errored()),
        metadata_errors: metadata_errors.iter().map(diagnostic).collect(),
    }
}

/// Report lists are ordered by policy name so artifacts are stable across runs.
fn by_name(policies: &[Policy]) -> Vec<Policy> {
    let mut out = policies.to_vec();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

pub fn diagnostic(err: &MetadataError) -> MetadataDiagnostic {
    MetadataDiagnostic {
        policy: err.policy.clone(),
        file: err.file.clone(),
        field: err.field,
        message: format!("missing metadata field \"{}\"", err.field),
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Fail on any violation; warn on errored policies or metadata diagnostics.
pub fn verdict(summary: &ReportSummary) -> Verdict {
    if summary.violated > 0 {
        Verdict::Fail
    } else if summary.errored > 0 || summary.metadata_errors > 0 {
        Verdict::Warn
    } else {
        Verdict::Pass
    }
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail (or warn with `fail_on = warning`).
pub fn verdict_exit_code(verdict: Verdict, fail_on: FailOn) -> i32 {
    match (verdict, fail_on) {
        (Verdict::Pass, _) => 0,
        (Verdict::Warn, FailOn::Violation) => 0,
        (Verdict::Warn, FailOn::Warning) => 2,
        (Verdict::Fail, _) => 2,
    }
}

pub fn parse_report_json(text: &str) -> anyhow::Result<ClusterguardReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse clusterguard report")
}

pub fn serialize_report(report: &ClusterguardReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

pub fn to_renderable(report: &ClusterguardReport) -> RenderableReport {
    RenderableReport {
        verdict: match report.verdict {
            Verdict::Pass => RenderableVerdictStatus::Pass,
            Verdict::Warn => RenderableVerdictStatus::Warn,
            Verdict::Fail => RenderableVerdictStatus::Fail,
        },
        summary: RenderableSummary {
            valid: report.summary.valid,
            violated: report.summary.violated,
            errored: report.summary.errored,
            metadata_errors: report.summary.metadata_errors,
        },
        groups: report
            .groups
            .iter()
            .map(|g| RenderableGroup {
                name: g.name.clone(),
                valid: g.valid.iter().map(renderable_policy).collect(),
                violated: g.violated.iter().map(renderable_policy).collect(),
            })
            .collect(),
        errored: report.errored.iter().map(renderable_policy).collect(),
        metadata_errors: report
            .metadata_errors
            .iter()
            .map(|d| RenderableDiagnostic {
                policy: d.policy.clone(),
                file: d.file.as_str().to_string(),
                message: d.message.clone(),
            })
            .collect(),
    }
}

fn renderable_policy(p: &Policy) -> RenderablePolicy {
    RenderablePolicy {
        name: p.name.clone(),
        title: p.title.clone(),
        file: p.file.as_str().to_string(),
        violations: p.violations.clone(),
        errors: p
            .processing_errors
            .iter()
            .map(|e| RenderableError {
                code: e.code.clone(),
                message: e.message.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterguard_types::{MetadataField, ProcessingError, RulePath};
    use time::macros::datetime;

    fn policy(name: &str, group: &str, valid: Option<bool>) -> Policy {
        Policy {
            name: name.to_string(),
            file: RulePath::new(format!("{name}.rego")),
            title: "T".to_string(),
            description: "D".to_string(),
            group: group.to_string(),
            valid,
            ..Policy::default()
        }
    }

    fn sample_result() -> PolicyEvaluationResult {
        let mut result = PolicyEvaluationResult::new();
        result.add_policy(policy("cluster.policy.a", "Security", Some(true)));
        result.add_policy(Policy {
            violations: vec!["bad".to_string()],
            ..policy("cluster.policy.b", "Security", Some(false))
        });
        result.add_policy(policy("cluster.policy.c", "Reliability", Some(true)));
        result.add_policy(Policy {
            processing_errors: vec![ProcessingError::new("missing_result", "no result")],
            ..policy("cluster.policy.d", "Reliability", None)
        });
        result
    }

    fn sample_report() -> ClusterguardReport {
        let errors = vec![MetadataError {
            policy: "cluster.policy.e".to_string(),
            file: RulePath::new("e.rego"),
            field: MetadataField::Group,
        }];
        build_report(
            &sample_result(),
            &errors,
            datetime!(2024-01-01 00:00:00 UTC),
            datetime!(2024-01-01 00:00:01 UTC),
        )
    }

    #[test]
    fn build_report_groups_and_counts() {
        let report = sample_report();
        assert_eq!(report.schema, SCHEMA_REPORT_V1);
        assert_eq!(report.tool.name, "clusterguard");
        assert_eq!(
            report.summary,
            ReportSummary {
                valid: 2,
                violated: 1,
                errored: 1,
                metadata_errors: 1,
            }
        );
        let names: Vec<&str> = report.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Reliability", "Security"]);
        assert_eq!(report.groups[1].violated[0].violations, vec!["bad"]);
        assert_eq!(report.errored[0].name, "cluster.policy.d");
        assert_eq!(
            report.metadata_errors[0].message,
            "missing metadata field \"group\""
        );
        assert_eq!(report.verdict, Verdict::Fail);
    }

    #[test]
    fn verdict_rules() {
        let summary = |violated, errored, metadata_errors| ReportSummary {
            valid: 1,
            violated,
            errored,
            metadata_errors,
        };
        assert_eq!(verdict(&summary(0, 0, 0)), Verdict::Pass);
        assert_eq!(verdict(&summary(0, 1, 0)), Verdict::Warn);
        assert_eq!(verdict(&summary(0, 0, 1)), Verdict::Warn);
        assert_eq!(verdict(&summary(1, 1, 1)), Verdict::Fail);
        assert_eq!(verdict(&ReportSummary::default()), Verdict::Pass);
    }

    #[test]
    fn verdict_exit_codes() {
        assert_eq!(verdict_exit_code(Verdict::Pass, FailOn::Violation), 0);
        assert_eq!(verdict_exit_code(Verdict::Warn, FailOn::Violation), 0);
        assert_eq!(verdict_exit_code(Verdict::Fail, FailOn::Violation), 2);
        assert_eq!(verdict_exit_code(Verdict::Pass, FailOn::Warning), 0);
        assert_eq!(verdict_exit_code(Verdict::Warn, FailOn::Warning), 2);
    }

    #[test]
    fn serialized_report_parses_back() {
        let report = sample_report();
        let bytes = serialize_report(&report).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains("\"started_at\": \"2024-01-01T00:00:00Z\""));
        assert_eq!(parse_report_json(&text).expect("parse"), report);
    }

    #[test]
    fn parse_report_rejects_foreign_schemas() {
        let err = parse_report_json(r#"{"schema":"other.report.v1"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown report schema"));
        assert!(parse_report_json("not json").is_err());
    }

    #[test]
    fn renderable_keeps_violations_and_errors() {
        let renderable = to_renderable(&sample_report());
        assert_eq!(renderable.verdict, RenderableVerdictStatus::Fail);
        assert_eq!(renderable.summary.valid, 2);
        assert_eq!(renderable.groups[1].violated[0].violations, vec!["bad"]);
        assert_eq!(renderable.errored[0].errors[0].code, "missing_result");
        assert_eq!(renderable.metadata_errors[0].file, "e.rego");
    }
}
