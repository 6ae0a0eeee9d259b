//! Shared test utilities for the clusterguard workspace.
//!
//! `xtask` regenerates golden reports at runtime, so normalization lives in a regular
//! crate instead of a `#[cfg(test)]` module.

use serde_json::Value;

pub const VERSION_PLACEHOLDER: &str = "__VERSION__";
pub const TIMESTAMP_PLACEHOLDER: &str = "__TIMESTAMP__";

const ENVELOPE_KEYS: [&str; 5] = ["schema", "tool", "verdict", "summary", "groups"];
const TIMESTAMP_KEYS: [&str; 2] = ["started_at", "finished_at"];

/// Normalize non-deterministic report fields for golden-file comparison.
///
/// `tool.version` is only replaced on the root object, and only when the root looks like
/// a report envelope. Timestamp keys are replaced at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ENVELOPE_KEYS.iter().all(|k| obj.contains_key(*k));
        if is_envelope
            && let Some(tool) = obj.get_mut("tool")
            && let Some(tool_obj) = tool.as_object_mut()
            && tool_obj.contains_key("version")
        {
            tool_obj.insert(
                "version".to_string(),
                Value::String(VERSION_PLACEHOLDER.to_string()),
            );
        }
    }
    normalize_timestamps(&mut value);
    value
}

fn normalize_timestamps(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in TIMESTAMP_KEYS {
                if let Some(v) = map.get_mut(key) {
                    *v = Value::String(TIMESTAMP_PLACEHOLDER.to_string());
                }
            }
            map.values_mut().for_each(normalize_timestamps);
        }
        Value::Array(arr) => arr.iter_mut().for_each(normalize_timestamps),
        _ => {}
    }
}
