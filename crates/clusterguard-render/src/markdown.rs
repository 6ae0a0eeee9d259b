use crate::{RenderablePolicy, RenderableReport, RenderableVerdictStatus};

const UNGROUPED: &str = "(no group)";

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Clusterguard report\n\n");
    let verdict = match report.verdict {
        RenderableVerdictStatus::Pass => "PASS",
        RenderableVerdictStatus::Warn => "WARN",
        RenderableVerdictStatus::Fail => "FAIL",
    };
    let s = &report.summary;
    out.push_str(&format!(
        "- Verdict: **{}**\n- Policies: {} valid, {} violated, {} errored\n- Metadata errors: {}\n\n",
        verdict, s.valid, s.violated, s.errored, s.metadata_errors
    ));

    if report.groups.is_empty() && report.errored.is_empty() && report.metadata_errors.is_empty() {
        out.push_str("No policies evaluated.\n");
        return out;
    }

    for group in &report.groups {
        let name = if group.name.is_empty() {
            UNGROUPED
        } else {
            group.name.as_str()
        };
        out.push_str(&format!("## {}\n\n", name));
        for p in &group.violated {
            push_policy(&mut out, "FAIL", p);
            for v in &p.violations {
                out.push_str(&format!("  - {}\n", v));
            }
        }
        for p in &group.valid {
            push_policy(&mut out, "PASS", p);
        }
        out.push('\n');
    }

    if !report.errored.is_empty() {
        out.push_str("## Errored\n\n");
        for p in &report.errored {
            push_policy(&mut out, "ERROR", p);
            for e in &p.errors {
                out.push_str(&format!("  - `{}`: {}\n", e.code, e.message));
            }
        }
        out.push('\n');
    }

    if !report.metadata_errors.is_empty() {
        out.push_str("## Metadata errors\n\n");
        for d in &report.metadata_errors {
            out.push_str(&format!("- `{}` (`{}`): {}\n", d.policy, d.file, d.message));
        }
        out.push('\n');
    }

    out
}

fn push_policy(out: &mut String, status: &str, p: &RenderablePolicy) {
    let name = if p.name.is_empty() {
        "<unidentified>"
    } else {
        p.name.as_str()
    };
    out.push_str(&format!("- [{}] `{}`", status, name));
    if !p.title.is_empty() {
        out.push_str(&format!(" {}", p.title));
    }
    if !p.file.is_empty() {
        out.push_str(&format!(" (`{}`)", p.file));
    }
    out.push('\n');
}
