use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clusterguard_types::{RulePath, ids};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

/// Discover rule files below `dir`.
///
/// Returns paths relative to `dir`, sorted. Exclude globs are matched against the
/// relative file path and its parent directory.
pub fn discover_rule_files(dir: &Utf8Path, excludes: &[String]) -> anyhow::Result<Vec<RulePath>> {
    if !dir.is_dir() {
        anyhow::bail!("policy directory {} does not exist", dir);
    }
    let exclude_set = build_globset(excludes).context("compile exclude globset")?;

    let mut out: Vec<RulePath> = Vec::new();
    for abs in WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| pathbuf_to_utf8(e.path().to_path_buf()))
        .filter(|p| p.extension() == Some(ids::RULE_FILE_EXTENSION))
    {
        let rel = abs
            .strip_prefix(dir)
            .unwrap_or(&abs)
            .as_str()
            .replace('\\', "/");

        let dir_rel = Utf8Path::new(&rel)
            .parent()
            .map(|p| p.as_str())
            .unwrap_or("");
        if exclude_set.is_match(&rel) || (!dir_rel.is_empty() && exclude_set.is_match(dir_rel)) {
            debug!(path = %rel, "excluded rule file");
            continue;
        }
        out.push(RulePath::new(&rel));
    }

    out.sort();
    out.dedup();
    Ok(out)
}

pub(crate) fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut b = GlobSetBuilder::new();
    for p in patterns {
        b.add(Glob::new(p)?);
    }
    Ok(b.build()?)
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}
