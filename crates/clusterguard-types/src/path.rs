use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical path of a rule file, relative to the policy directory it was loaded from.
///
/// Normalization rules are intentionally simple and deterministic:
/// - always forward slashes (`/`)
/// - no leading `./`
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RulePath(String);

impl RulePath {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let mut v = s.as_ref().replace('\\', "/");
        while v.starts_with("./") {
            v = v.trim_start_matches("./").to_string();
        }
        Self(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name without directories and without the extension.
    pub fn stem(&self) -> &str {
        Utf8Path::new(&self.0).file_stem().unwrap_or(self.0.as_str())
    }

    pub fn to_utf8_pathbuf(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.0.clone())
    }
}

impl std::fmt::Display for RulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Utf8Path> for RulePath {
    fn from(value: &Utf8Path) -> Self {
        RulePath::new(value.as_str())
    }
}

impl From<Utf8PathBuf> for RulePath {
    fn from(value: Utf8PathBuf) -> Self {
        RulePath::new(value.as_str())
    }
}
