//! Parameter redaction and preview bounding for audit records: `parameters_redacted`,
//! `data_preview` (mapping, size-bounded).

const REDACTED_KEY_MARKERS: [&str; 4] = ["secret", "token", "password", "credential"];
const DEFAULT_PREVIEW_BYTES: usize = 2_048;

/// Replace values under sensitive-looking keys with a placeholder, recursively.
pub fn redact_params(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let lower = k.to_lowercase();
                if REDACTED_KEY_MARKERS.iter().any(|marker| lower.contains(marker)) {
                    out.insert(k.clone(), serde_json::Value::String("<redacted>".into()));
                } else {
                    out.insert(k.clone(), redact_params(v));
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_params).collect())
        }
        other => other.clone(),
    }
}

/// Bound a tool's full result to a prompt-safe preview. If the serialized form fits
/// within the budget it is returned unchanged; otherwise it is replaced with a
/// truncated string marker so a verbose tool never blows out the agent's prompt.
pub fn bound_preview(value: &serde_json::Value, max_bytes: usize) -> serde_json::Value {
    let serialized = match serde_json::to_string(value) {
        Ok(s) => s,
        Err(_) => return serde_json::Value::String("<unserializable>".into()),
    };
    if serialized.len() <= max_bytes {
        return value.clone();
    }
    let mut truncated: String = serialized.chars().take(max_bytes).collect();
    truncated.push_str("...<truncated>");
    serde_json::json!({ "truncated_preview": truncated })
}

pub fn default_preview(value: &serde_json::Value) -> serde_json::Value {
    bound_preview(value, DEFAULT_PREVIEW_BYTES)
}
