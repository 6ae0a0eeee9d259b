//! Batch compilation of rule sources into an immutable [`ModuleSet`].

use crate::engine::RuleEngine;
use crate::metadata::{self, Annotations};
use crate::namespace::PolicyNamespace;
use clusterguard_types::{RuleFile, RulePath, ids};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{path}: {message}")]
    Syntax { path: RulePath, message: String },

    #[error("{path}: no package declaration")]
    MissingPackage { path: RulePath },

    #[error("{path}: invalid METADATA annotations: {message}")]
    Annotations { path: RulePath, message: String },

    #[error("{path}: rule file supplied more than once")]
    DuplicatePath { path: RulePath },

    #[error("policy {identity} is declared by both {first} and {second}")]
    DuplicatePolicy {
        identity: String,
        first: RulePath,
        second: RulePath,
    },
}

impl CompileError {
    /// The rule file the error points at.
    pub fn path(&self) -> &RulePath {
        match self {
            CompileError::Syntax { path, .. }
            | CompileError::MissingPackage { path }
            | CompileError::Annotations { path, .. }
            | CompileError::DuplicatePath { path } => path,
            CompileError::DuplicatePolicy { second, .. } => second,
        }
    }
}

/// One compiled rule source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    /// Logical name of the source file.
    pub name: String,
    pub path: RulePath,
    /// Declared package path, without the `data.` root.
    pub package: String,
    pub source: String,
    /// Package-level METADATA block, if the source has one.
    pub annotations: Option<Annotations>,
}

impl Module {
    /// Test modules are compiled but never treated as policies or evaluated.
    pub fn is_test(&self) -> bool {
        RulePath::new(&self.name)
            .stem()
            .ends_with(ids::TEST_MODULE_SUFFIX)
            || self.package.ends_with(ids::TEST_MODULE_SUFFIX)
    }

    pub fn is_policy(&self, namespace: &PolicyNamespace) -> bool {
        namespace.contains(&self.package) && !self.is_test()
    }
}

/// The compiled, read-only form of a rule-source batch, ordered by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleSet {
    modules: Vec<Module>,
}

impl ModuleSet {
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Modules loaded for evaluation (everything except test modules).
    pub fn runtime_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(|m| !m.is_test())
    }

    /// A new set holding the modules for which `keep` returns true, order preserved.
    pub fn filtered(&self, keep: impl Fn(&Module) -> bool) -> ModuleSet {
        ModuleSet {
            modules: self.modules.iter().filter(|m| keep(m)).cloned().collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.path.as_str() == path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Compile a full batch of rule files.
///
/// All-or-nothing: the first invalid file aborts the call and nothing is returned.
pub fn compile<E: RuleEngine + ?Sized>(
    files: &[RuleFile],
    engine: &E,
    namespace: &PolicyNamespace,
) -> Result<ModuleSet, CompileError> {
    let mut modules: Vec<Module> = Vec::with_capacity(files.len());

    for file in files {
        if modules.iter().any(|m| m.path == file.path) {
            return Err(CompileError::DuplicatePath {
                path: file.path.clone(),
            });
        }

        engine
            .validate(file)
            .map_err(|message| CompileError::Syntax {
                path: file.path.clone(),
                message,
            })?;

        let package =
            parse_package(&file.content).ok_or_else(|| CompileError::MissingPackage {
                path: file.path.clone(),
            })?;

        let annotations = metadata::parse_annotations(&file.content).map_err(|message| {
            CompileError::Annotations {
                path: file.path.clone(),
                message,
            }
        })?;

        debug!(path = %file.path, package = %package, "compiled rule module");
        modules.push(Module {
            name: file.name.clone(),
            path: file.path.clone(),
            package,
            source: file.content.clone(),
            annotations,
        });
    }

    modules.sort_by(|a, b| a.path.cmp(&b.path));
    check_unique_policies(&modules, namespace)?;

    Ok(ModuleSet { modules })
}

fn check_unique_policies(
    modules: &[Module],
    namespace: &PolicyNamespace,
) -> Result<(), CompileError> {
    let mut seen: BTreeMap<&str, &RulePath> = BTreeMap::new();
    for module in modules.iter().filter(|m| m.is_policy(namespace)) {
        if let Some(first) = seen.insert(&module.package, &module.path) {
            return Err(CompileError::DuplicatePolicy {
                identity: module.package.clone(),
                first: first.clone(),
                second: module.path.clone(),
            });
        }
    }
    Ok(())
}

/// Extract the package path from the first `package` declaration outside comments.
pub fn parse_package(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let code = line.split('#').next().unwrap_or_default().trim();
        let rest = code.strip_prefix("package")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let package = rest.trim();
        let package = package.strip_prefix("data.").unwrap_or(package);
        (!package.is_empty()).then(|| package.to_string())
    })
}
