use crate::RulePath;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A raw rule source as supplied by a rule source (directory, archive, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleFile {
    /// Logical name, typically the file name (`logging.rego`).
    pub name: String,
    pub path: RulePath,
    pub content: String,
}

impl RuleFile {
    pub fn new(name: impl Into<String>, path: impl AsRef<str>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: RulePath::new(path),
            content: content.into(),
        }
    }
}

/// Documentation fields every evaluable policy must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Title,
    Description,
    Group,
}

impl MetadataField {
    pub const REQUIRED: [MetadataField; 3] = [
        MetadataField::Title,
        MetadataField::Description,
        MetadataField::Group,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetadataField::Title => "title",
            MetadataField::Description => "description",
            MetadataField::Group => "group",
        }
    }
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem hit while turning an evaluation outcome into a policy verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingError {
    pub code: String,
    pub message: String,
}

impl ProcessingError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A documented compliance policy.
///
/// The same record is used for the skeleton built from compiled metadata and for the
/// completed policy carrying an evaluation verdict.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Policy {
    /// Fully-qualified package path, e.g. `cluster.policy.logging`.
    pub name: String,
    pub file: RulePath,
    pub title: String,
    pub description: String,
    pub group: String,

    /// `None` until an evaluation outcome has been correlated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processing_errors: Vec<ProcessingError>,
}

impl Policy {
    /// Required metadata fields that are empty, in declaration order.
    pub fn missing_metadata(&self) -> Vec<MetadataField> {
        MetadataField::REQUIRED
            .into_iter()
            .filter(|field| self.metadata_value(*field).is_empty())
            .collect()
    }

    pub fn metadata_value(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Title => &self.title,
            MetadataField::Description => &self.description,
            MetadataField::Group => &self.group,
        }
    }

    pub fn has_processing_errors(&self) -> bool {
        !self.processing_errors.is_empty()
    }
}
