use anyhow::Context;
use camino::Utf8Path;
use serde_json::Value as JsonValue;

/// Input document formats accepted by [`load_input`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// YAML for `.yaml` / `.yml`, JSON otherwise.
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension().map(str::to_ascii_lowercase).as_deref() {
            Some("yaml" | "yml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }
}

/// Read the evaluation input document.
pub fn load_input(path: &Utf8Path) -> anyhow::Result<JsonValue> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    parse_input(&text, InputFormat::from_path(path)).with_context(|| format!("parse {}", path))
}

pub fn parse_input(text: &str, format: InputFormat) -> anyhow::Result<JsonValue> {
    let value = match format {
        InputFormat::Json => serde_json::from_str(text).context("parse input JSON")?,
        InputFormat::Yaml => serde_yaml::from_str(text).context("parse input YAML")?,
    };
    Ok(value)
}
