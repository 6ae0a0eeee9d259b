//! Render use cases: markdown and GitHub annotations from in-memory reports.

use clusterguard_render::RenderableReport;

pub fn render_markdown(report: &RenderableReport) -> String {
    clusterguard_render::render_markdown(report)
}

pub fn render_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    clusterguard_render::render_github_annotations(report)
        .into_iter()
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterguard_render::{
        RenderableGroup, RenderablePolicy, RenderableSummary, RenderableVerdictStatus,
    };

    fn sample_report() -> RenderableReport {
        let violated = |name: &str| RenderablePolicy {
            name: name.to_string(),
            file: format!("{name}.rego"),
            violations: vec!["bad".to_string()],
            ..RenderablePolicy::default()
        };
        RenderableReport {
            verdict: RenderableVerdictStatus::Fail,
            summary: RenderableSummary {
                violated: 2,
                ..RenderableSummary::default()
            },
            groups: vec![RenderableGroup {
                name: "Security".to_string(),
                valid: Vec::new(),
                violated: vec![violated("a"), violated("b")],
            }],
            errored: Vec::new(),
            metadata_errors: Vec::new(),
        }
    }

    #[test]
    fn render_annotations_respects_max() {
        let report = sample_report();
        assert_eq!(render_annotations(&report, 1).len(), 1);
        assert_eq!(render_annotations(&report, 10).len(), 2);
    }

    #[test]
    fn render_markdown_smoke() {
        let markdown = render_markdown(&sample_report());
        assert!(markdown.contains("## Security"));
    }
}
