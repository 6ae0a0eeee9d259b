//! Developer tasks (schema generation, fixture conformance and refresh).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use clusterguard_test_util::normalize_nondeterministic;
use schemars::schema_for;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Project root (parent of the xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("determine current directory")?,
    };
    if manifest_dir.ends_with("xtask")
        && let Some(parent) = manifest_dir.parent()
    {
        return Ok(parent.to_path_buf());
    }
    Ok(manifest_dir)
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

fn fixtures_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("tests").join("fixtures"))
}

struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(clusterguard_types::ClusterguardReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(clusterguard_settings::ClusterguardConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "clusterguard.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "clusterguard.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Pretty-printed JSON with trailing newline.
fn serialize_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("serialize json")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).context("create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_json(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json).with_context(|| format!("write schema {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Check that schemas/ matches what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_json(&(spec.generate)())?;
        let actual =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    for name in &missing {
        eprintln!("missing schema: {name}");
    }
    for name in &mismatched {
        eprintln!("schema out of date: {name}");
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("schema validation failed")
}

/// Processing error codes are lowercase snake_case tokens.
fn is_valid_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Relative, forward slashes only, no parent traversal.
fn is_clean_path(path: &str) -> bool {
    !(path.starts_with('/')
        || path.contains("..")
        || path.contains('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':'))
}

/// Every policy entry of a report, wherever it is listed.
fn report_policies(report: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    if let Some(groups) = report.get("groups").and_then(Value::as_array) {
        for group in groups {
            for bucket in ["valid", "violated"] {
                if let Some(list) = group.get(bucket).and_then(Value::as_array) {
                    out.extend(list);
                }
            }
        }
    }
    if let Some(list) = report.get("errored").and_then(Value::as_array) {
        out.extend(list);
    }
    out
}

/// Lint one report: schema validity, path hygiene and code hygiene.
fn conformance_errors(
    label: &str,
    report: &Value,
    validator: &jsonschema::Validator,
) -> Vec<String> {
    let mut errors: Vec<String> = validator
        .iter_errors(report)
        .map(|err| format!("{label}: schema validation: {err}"))
        .collect();

    for policy in report_policies(report) {
        let name = policy.get("name").and_then(Value::as_str).unwrap_or_default();
        if let Some(file) = policy.get("file").and_then(Value::as_str)
            && !file.is_empty()
            && !is_clean_path(file)
        {
            errors.push(format!("{label}: policy {name:?} file {file:?} is not clean"));
        }
        let codes = policy
            .get("processing_errors")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|e| e.get("code").and_then(Value::as_str));
        for code in codes {
            if !is_valid_token(code) {
                errors.push(format!("{label}: policy {name:?} code {code:?} is not a valid token"));
            }
        }
    }
    errors
}

fn fixture_dirs() -> anyhow::Result<Vec<PathBuf>> {
    let dir = fixtures_dir()?;
    let mut out = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() && path.join("clusterguard.toml").exists() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn fixture_name(dir: &Path) -> String {
    dir.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

/// Validate every golden report under tests/fixtures/ against the report schema.
fn conform() -> anyhow::Result<()> {
    let schema = serde_json::to_value(generate_report_schema()).context("report schema")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("compile report schema: {e}"))?;

    let mut errors = Vec::new();
    let mut count = 0;
    for dir in fixture_dirs()? {
        let golden = dir.join("expected.report.json");
        if !golden.exists() {
            continue;
        }
        let name = fixture_name(&dir);
        errors.extend(conformance_errors(&name, &read_json(&golden)?, &validator));
        count += 1;
        println!("  checked {name}");
    }

    if count == 0 {
        bail!("no golden reports found");
    }
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("conformance failed with {} errors", errors.len());
    }
    println!("All {count} golden reports conform.");
    Ok(())
}

fn fixture_input(dir: &Path) -> Option<&'static str> {
    ["input.json", "input.yaml", "input.yml"]
        .into_iter()
        .find(|name| dir.join(name).exists())
}

/// Re-run the built binary on every fixture and rewrite its golden report.
fn update_fixtures() -> anyhow::Result<()> {
    let bin = project_root()?.join("target").join("debug").join("clusterguard");
    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");
    if !bin.exists() {
        bail!(
            "clusterguard binary not found at {}.\nRun `cargo build -p clusterguard-cli` first.",
            bin.display()
        );
    }

    for dir in fixture_dirs()? {
        let name = fixture_name(&dir);
        let Some(input) = fixture_input(&dir) else {
            eprintln!("  skipped {name}: no input document");
            continue;
        };
        let tmp = tempfile::tempdir().context("create temp dir")?;
        let report_out = tmp.path().join("report.json");

        let output = std::process::Command::new(&bin)
            .current_dir(&dir)
            .arg("check")
            .arg("--input")
            .arg(input)
            .arg("--report-out")
            .arg(&report_out)
            .output()
            .with_context(|| format!("run clusterguard on fixture {name}"))?;
        if output.status.code() == Some(1) || !report_out.exists() {
            bail!(
                "fixture {name}: clusterguard failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let report = normalize_nondeterministic(read_json(&report_out)?);
        let golden = dir.join("expected.report.json");
        fs::write(&golden, serialize_json(&report)?)
            .with_context(|| format!("write {}", golden.display()))?;
        println!("  updated {name}");
    }
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate golden fixture reports against the report schema");
    eprintln!("  update-fixtures   Regenerate golden reports with the debug binary");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "update-fixtures" => update_fixtures(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
