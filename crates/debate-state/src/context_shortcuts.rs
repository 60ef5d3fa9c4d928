//! Typed accessors over `DebateState::context`, which is stored as loosely-typed
//! JSON (see [`crate::debate::context_keys`]) so that new context keys don't require
//! a schema migration, but most call sites want a `&str` back, not a `Value`.

use crate::debate::{context_keys, DebateState};

/// Read a string-valued context entry by its well-known key.
pub fn get_str<'a>(state: &'a DebateState, key: &str) -> Option<&'a str> {
    state.context.get(key).and_then(|v| v.as_str())
}

pub fn incident_summary(state: &DebateState) -> Option<&str> {
    get_str(state, context_keys::INCIDENT_SUMMARY)
}

pub fn raw_log_excerpt(state: &DebateState) -> Option<&str> {
    get_str(state, context_keys::RAW_LOG_EXCERPT)
}

pub fn asset_mapping(state: &DebateState) -> Option<&serde_json::Value> {
    state.context.get(context_keys::ASSET_MAPPING)
}

pub fn accumulated_summary(state: &DebateState) -> Option<&str> {
    get_str(state, context_keys::ACCUMULATED_SUMMARY)
}

/// True once `collect_assets` has produced a non-empty, non-null asset mapping —
/// the gate the rule-based supervisor checks before leaving `asset_mapping` phase.
pub fn has_usable_asset_mapping(state: &DebateState) -> bool {
    match asset_mapping(state) {
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Array(arr)) => !arr.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_is_none() {
        let state = DebateState::new();
        assert_eq!(incident_summary(&state), None);
        assert!(!has_usable_asset_mapping(&state));
    }

    #[test]
    fn usable_mapping_detected() {
        let mut state = DebateState::new();
        state
            .context
            .insert(context_keys::ASSET_MAPPING.to_string(), json!({"svc": "checkout"}));
        assert!(has_usable_asset_mapping(&state));
    }

    #[test]
    fn empty_mapping_is_not_usable() {
        let mut state = DebateState::new();
        state
            .context
            .insert(context_keys::ASSET_MAPPING.to_string(), json!({}));
        assert!(!has_usable_asset_mapping(&state));
    }
}
