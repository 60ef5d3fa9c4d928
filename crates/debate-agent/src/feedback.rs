//! Feedback composition and the failure-handling rules for a specialist turn: a
//! non-retryable pre-call error fails the turn outright, a retryable failure after
//! gateway exhaustion degrades it, and a successful-but-unparsable output degrades it
//! while preserving the raw text as one chat message.

use crate::parser::ParsedOutput;
use debate_state::{Evidence, Feedback, FeedbackStatus};
use std::collections::HashSet;

fn string_array(value: &serde_json::Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn summary_text(value: &serde_json::Value) -> String {
    value
        .get("summary")
        .and_then(serde_json::Value::as_str)
        .or_else(|| value.get("chat_message").and_then(serde_json::Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn confidence_value(value: &serde_json::Value) -> f64 {
    value
        .get("confidence")
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

/// Build feedback from a successfully-parsed output. `structured_ok = false` downgrades
/// status to [`FeedbackStatus::Degraded`] even though the LLM call itself succeeded.
pub fn compose_feedback(round: u32, parsed: &ParsedOutput, evidence: &[Evidence]) -> Feedback {
    let status = if parsed.structured_ok {
        FeedbackStatus::Ok
    } else {
        FeedbackStatus::Degraded
    };
    Feedback {
        round,
        status,
        summary: summary_text(&parsed.value),
        evidence_refs: evidence.iter().map(|e| e.evidence_id).collect(),
        confidence: confidence_value(&parsed.value),
        missing_info: string_array(&parsed.value, "missing_info"),
        open_questions: string_array(&parsed.value, "open_questions"),
    }
}

/// Degraded feedback for a turn that never produced a parseable LLM response: the
/// gateway timed out or exhausted retries.
pub fn degraded_feedback(round: u32, reason: impl Into<String>) -> Feedback {
    Feedback {
        round,
        status: FeedbackStatus::Degraded,
        summary: reason.into(),
        evidence_refs: HashSet::new(),
        confidence: 0.0,
        missing_info: Vec::new(),
        open_questions: Vec::new(),
    }
}

/// Failed feedback for a turn that could not even be attempted: e.g. every tool this
/// command required was unavailable, or a configuration bug surfaced before the LLM
/// call — a non-retryable failure, unlike the gateway-exhaustion case above.
pub fn failed_feedback(round: u32, reason: impl Into<String>) -> Feedback {
    Feedback {
        round,
        status: FeedbackStatus::Failed,
        summary: reason.into(),
        evidence_refs: HashSet::new(),
        confidence: 0.0,
        missing_info: Vec::new(),
        open_questions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_state::{SourceKind, Strength};

    #[test]
    fn structured_output_yields_ok_status_with_confidence_and_evidence_refs() {
        let parsed = ParsedOutput {
            value: serde_json::json!({
                "summary": "disk nearly full",
                "confidence": 0.75,
                "missing_info": ["exact threshold"],
            }),
            structured_ok: true,
        };
        let ev = Evidence::new(SourceKind::Log, "a", "b", Strength::Strong, "LogAgent");
        let feedback = compose_feedback(2, &parsed, std::slice::from_ref(&ev));

        assert_eq!(feedback.status, FeedbackStatus::Ok);
        assert_eq!(feedback.confidence, 0.75);
        assert_eq!(feedback.missing_info, vec!["exact threshold".to_string()]);
        assert!(feedback.evidence_refs.contains(&ev.evidence_id));
    }

    #[test]
    fn unstructured_fallback_degrades_even_without_missing_fields() {
        let parsed = ParsedOutput {
            value: serde_json::json!({"chat_message": "I'm not sure what caused this."}),
            structured_ok: false,
        };
        let feedback = compose_feedback(1, &parsed, &[]);
        assert_eq!(feedback.status, FeedbackStatus::Degraded);
        assert_eq!(feedback.summary, "I'm not sure what caused this.");
    }

    #[test]
    fn degraded_and_failed_constructors_carry_zero_confidence() {
        let degraded = degraded_feedback(3, "llm call timed out");
        let failed = failed_feedback(3, "no required tool was available");
        assert_eq!(degraded.status, FeedbackStatus::Degraded);
        assert_eq!(failed.status, FeedbackStatus::Failed);
        assert_eq!(degraded.confidence, 0.0);
        assert_eq!(failed.confidence, 0.0);
    }

    #[test]
    fn confidence_is_clamped_to_unit_range() {
        let parsed = ParsedOutput {
            value: serde_json::json!({"summary": "x", "confidence": 1.4}),
            structured_ok: true,
        };
        let feedback = compose_feedback(1, &parsed, &[]);
        assert_eq!(feedback.confidence, 1.0);
    }
}
