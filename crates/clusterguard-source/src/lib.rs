//! Rule source adapters: discover policy directories, read rule files and input documents.
//!
//! This crate is allowed to do filesystem IO. Everything it returns is plain data for the
//! pure domain crate.

#![forbid(unsafe_code)]

mod discover;
mod input;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clusterguard_types::RuleFile;
use rayon::prelude::*;
use tracing::{debug, info};

pub use discover::discover_rule_files;
pub use input::{InputFormat, load_input, parse_input};

/// Read every rule file below `dir`.
///
/// Paths are relative to `dir`; the logical name is the file name.
pub fn load_rule_files(dir: &Utf8Path, excludes: &[String]) -> anyhow::Result<Vec<RuleFile>> {
    let paths = discover_rule_files(dir, excludes)
        .with_context(|| format!("discover rule files in {}", dir))?;

    let files = paths
        .par_iter()
        .map(|rel| {
            let abs = dir.join(rel.as_str());
            let content =
                std::fs::read_to_string(&abs).with_context(|| format!("read {}", abs))?;
            let name = abs.file_name().unwrap_or(rel.as_str()).to_string();
            debug!(path = %rel, "read rule file");
            Ok(RuleFile {
                name,
                path: rel.clone(),
                content,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    info!(dir = %dir, files = files.len(), "loaded rule files");
    Ok(files)
}

/// Read the rule files of several policy directories, in directory order.
///
/// Paths stay relative to their own directory, so the same relative path in two
/// directories is rejected later by the compiler.
pub fn load_policy_dirs(dirs: &[Utf8PathBuf], excludes: &[String]) -> anyhow::Result<Vec<RuleFile>> {
    let mut out = Vec::new();
    for dir in dirs {
        out.extend(load_rule_files(dir, excludes)?);
    }
    Ok(out)
}
