//! Stable identifiers used in reports.
//!
//! Codes are short snake_case discriminators attached to processing errors.

/// Package prefix used when no namespace is configured.
pub const DEFAULT_NAMESPACE: &str = "cluster.policy";

/// File extension of rule sources.
pub const RULE_FILE_EXTENSION: &str = "rego";

/// Suffix marking test modules (file stem or package).
pub const TEST_MODULE_SUFFIX: &str = "_test";

// Codes: evaluation outcome correlation
pub const CODE_UNIDENTIFIABLE_RESULT: &str = "unidentifiable_result";
pub const CODE_UNKNOWN_POLICY: &str = "unknown_policy";
pub const CODE_DUPLICATE_RESULT: &str = "duplicate_result";
pub const CODE_MISSING_RESULT: &str = "missing_result";
pub const CODE_INVALID_RESULT_SHAPE: &str = "invalid_result_shape";

// Codes: metadata
pub const CODE_METADATA_INCOMPLETE: &str = "metadata_incomplete";
