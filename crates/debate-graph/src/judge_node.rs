//! The `judge` node: the only point in the graph allowed to write `final_result`,
//! which may be set only during the judgment phase. Wraps `AgentRunner::run` exactly
//! like [`crate::agent_node::AgentNode`], then lifts the judge's own structured
//! output into a `FinalResult` using the evidence it cited in that same turn.
//!
//! The verification phase runs afterward and produces ordinary feedback/agent output
//! reviewing the judge's conclusion; it does not touch `final_result` — the reducer is
//! set-once, and only the judgment phase is allowed to set it.

use crate::node::{Node, NodeError};
use async_trait::async_trait;
use debate_agent::AgentRunner;
use debate_state::{Clock, DebateState, FinalResult, RiskLevel, SessionId, StateDelta};
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub struct JudgeNode {
    node_name: String,
    agent_name: String,
    session_id: SessionId,
    runner: Arc<AgentRunner>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl JudgeNode {
    pub fn new(
        node_name: impl Into<String>,
        agent_name: impl Into<String>,
        session_id: SessionId,
        runner: Arc<AgentRunner>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            agent_name: agent_name.into(),
            session_id,
            runner,
            clock,
        }
    }
}

fn text_field(value: &Value, field: &str) -> String {
    value.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn confidence_field(value: &Value) -> f64 {
    value
        .get("confidence")
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

fn risk_level_field(value: &Value) -> RiskLevel {
    match value.get("risk_level").and_then(Value::as_str).map(str::to_ascii_lowercase).as_deref() {
        Some("low") => RiskLevel::Low,
        Some("high") => RiskLevel::High,
        Some("critical") => RiskLevel::Critical,
        _ => RiskLevel::Medium,
    }
}

/// Build a `FinalResult` from the judge's parsed output plus the evidence it cited
/// this turn. Never fails: a judge output with no usable `root_cause` yields a result
/// with an empty one, which the Report Guard rejects the same way it would reject a
/// blocked-phrase conclusion — this node's job is to translate, not to gate.
fn build_final_result(value: &Value, cited_evidence: &[debate_state::Evidence]) -> FinalResult {
    FinalResult {
        root_cause: text_field(value, "root_cause"),
        confidence: confidence_field(value),
        evidence_chain: cited_evidence.iter().map(|e| e.evidence_id).collect(),
        impact: text_field(value, "impact"),
        fix_recommendation: text_field(value, "fix_recommendation"),
        verification_plan: text_field(value, "verification_plan"),
        risk_level: risk_level_field(value),
    }
}

#[async_trait]
impl Node for JudgeNode {
    fn name(&self) -> &str {
        &self.node_name
    }

    async fn run(&self, state: &DebateState, cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let Some(command) = state.commands.get(&self.agent_name) else {
            return Err(NodeError::Failed {
                node: self.node_name.clone(),
                reason: format!("no pending command for {}", self.agent_name),
            });
        };
        let round = command.issued_round;
        let phase = state.route.current_phase;
        let mut delta = self
            .runner
            .run(&self.agent_name, self.session_id, state, phase, command, round, self.clock.as_ref(), cancel.as_ref())
            .await;

        if let Some(parsed) = delta.agent_outputs.get(&self.agent_name).cloned() {
            let result = build_final_result(&parsed, &delta.evidence);
            delta.final_result = Some(result);
        }

        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_state::{Evidence, SourceKind, Strength};
    use serde_json::json;

    #[test]
    fn builds_a_final_result_from_a_well_formed_judge_output() {
        let value = json!({
            "root_cause": "disk full on checkout-db-2",
            "confidence": 0.9,
            "impact": "checkout outage",
            "fix_recommendation": "expand the volume",
            "verification_plan": "watch disk usage for 24h",
            "risk_level": "high",
        });
        let evidence = vec![
            Evidence::new(SourceKind::Log, "a", "b", Strength::Strong, "JudgeAgent"),
            Evidence::new(SourceKind::Metric, "c", "d", Strength::Medium, "JudgeAgent"),
        ];
        let result = build_final_result(&value, &evidence);
        assert_eq!(result.root_cause, "disk full on checkout-db-2");
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.evidence_chain.len(), 2);
    }

    #[test]
    fn missing_root_cause_yields_an_empty_one_rather_than_failing() {
        let result = build_final_result(&json!({"confidence": 0.5}), &[]);
        assert!(result.root_cause.is_empty());
    }

    #[test]
    fn unparseable_risk_level_defaults_to_medium() {
        let result = build_final_result(&json!({"risk_level": "catastrophic"}), &[]);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }
}
