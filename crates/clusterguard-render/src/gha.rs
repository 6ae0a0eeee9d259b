use crate::RenderableReport;

/// Render results as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} file={path}::[{policy}] {message}`
///
/// Violations are errors; processing errors and metadata diagnostics are warnings.
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for group in &report.groups {
        for p in &group.violated {
            if p.violations.is_empty() {
                out.push(annotation("error", &p.file, &p.name, "policy violated"));
            }
            for v in &p.violations {
                out.push(annotation("error", &p.file, &p.name, v));
            }
        }
    }

    for p in &report.errored {
        for e in &p.errors {
            let tag = if p.name.is_empty() {
                e.code.clone()
            } else {
                format!("{}:{}", p.name, e.code)
            };
            out.push(annotation("warning", &p.file, &tag, &e.message));
        }
    }

    for d in &report.metadata_errors {
        out.push(annotation("warning", &d.file, &d.policy, &d.message));
    }

    out
}

fn annotation(level: &str, file: &str, tag: &str, message: &str) -> String {
    let message = format!("[{}] {}", tag, message)
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    if file.is_empty() {
        format!("::{}::{}", level, message)
    } else {
        format!("::{} file={}::{}", level, file, message)
    }
}
