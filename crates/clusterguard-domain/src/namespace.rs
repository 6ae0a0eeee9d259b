use clusterguard_types::ids;

/// Package prefix under which rule modules are treated as policies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PolicyNamespace(String);

impl Default for PolicyNamespace {
    fn default() -> Self {
        PolicyNamespace::new(ids::DEFAULT_NAMESPACE)
    }
}

impl PolicyNamespace {
    /// Accepts both `cluster.policy` and `data.cluster.policy`.
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let v = s.as_ref().trim();
        let v = v.strip_prefix("data.").unwrap_or(v);
        Self(v.trim_end_matches('.').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `package` is a direct child of this namespace (`<namespace>.<id>`).
    ///
    /// Deeper packages are not policies: the evaluation query only enumerates direct
    /// children, so they could never be bound to a result.
    pub fn contains(&self, package: &str) -> bool {
        package
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
    }

    /// Resolve a binding name to a fully-qualified policy identity.
    pub fn qualify(&self, name: &str) -> String {
        if self.contains(name) {
            name.to_string()
        } else {
            format!("{}.{}", self.0, name)
        }
    }

    /// Query enumerating every package under the namespace, bound to `name`.
    pub fn query(&self) -> String {
        format!("data.{}[name]", self.0)
    }
}

impl std::fmt::Display for PolicyNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
