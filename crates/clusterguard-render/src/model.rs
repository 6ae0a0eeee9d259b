#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableVerdictStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderableSummary {
    pub valid: u32,
    pub violated: u32,
    pub errored: u32,
    pub metadata_errors: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableError {
    pub code: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderablePolicy {
    /// Fully qualified identity; empty for results that could not be attributed.
    pub name: String,
    pub title: String,
    pub file: String,
    pub violations: Vec<String>,
    pub errors: Vec<RenderableError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableGroup {
    pub name: String,
    pub valid: Vec<RenderablePolicy>,
    pub violated: Vec<RenderablePolicy>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableDiagnostic {
    pub policy: String,
    pub file: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableReport {
    pub verdict: RenderableVerdictStatus,
    pub summary: RenderableSummary,
    pub groups: Vec<RenderableGroup>,
    pub errored: Vec<RenderablePolicy>,
    pub metadata_errors: Vec<RenderableDiagnostic>,
}
