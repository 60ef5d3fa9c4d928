//! Evidence extraction from a parsed specialist output: read the `"evidence"` array
//! off the parsed JSON and map each entry onto a typed [`debate_state::Evidence`]
//! record, tagged with the producing agent.

use debate_state::{Evidence, SourceKind, Strength};
use serde_json::Value;

fn source_kind_from_str(s: &str) -> Option<SourceKind> {
    match s.to_ascii_lowercase().as_str() {
        "log" => Some(SourceKind::Log),
        "code" => Some(SourceKind::Code),
        "domain" => Some(SourceKind::Domain),
        "metric" | "metrics" => Some(SourceKind::Metric),
        "change" => Some(SourceKind::Change),
        "runbook" => Some(SourceKind::Runbook),
        "trace" => Some(SourceKind::Trace),
        _ => None,
    }
}

fn strength_from_str(s: &str) -> Strength {
    match s.to_ascii_lowercase().as_str() {
        "strong" => Strength::Strong,
        "weak" => Strength::Weak,
        _ => Strength::Medium,
    }
}

/// Extract every well-formed entry of the output's `evidence` array. Entries missing
/// `source_kind`/`source_ref`/`description`, or naming an unrecognized source kind, are
/// silently dropped rather than failing the whole turn — a specialist's one malformed
/// citation shouldn't sink every other claim it made.
pub fn extract_evidence(parsed_value: &Value, producing_agent: &str) -> Vec<Evidence> {
    let Some(entries) = parsed_value.get("evidence").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let source_kind = source_kind_from_str(entry.get("source_kind")?.as_str()?)?;
            let source_ref = entry.get("source_ref")?.as_str()?;
            let description = entry.get("description")?.as_str()?;
            let strength = entry
                .get("strength")
                .and_then(Value::as_str)
                .map(strength_from_str)
                .unwrap_or(Strength::Medium);
            Some(Evidence::new(source_kind, source_ref, description, strength, producing_agent))
        })
        .collect()
}
