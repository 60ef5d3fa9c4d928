//! Commutative reducers and the `apply(delta)` entry point.
//!
//! All reducers here are commutative *within a single parallel fan-out step*: two
//! specialists writing to disjoint keys of `agent_outputs`/`feedback`/`commands`
//! produce the same resulting map regardless of which delta is merged first, because
//! each key is independently replaced. `messages` and `evidence` use append/dedup
//! reducers that are commutative under id-based de-duplication (merging the same
//! message or evidence twice, in either order, yields the same set). `metrics` uses
//! element-wise addition, which is commutative and associative by construction.

use crate::debate::{Command, DebateState, Feedback, FinalResult, Message, Metrics, Route};
use crate::error::StateError;
use crate::evidence::Evidence;
use std::collections::{HashMap, HashSet};

/// A partial update to [`DebateState`]. Every field is optional; absent fields are
/// left untouched by `apply`.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub messages: Vec<Message>,
    pub context: HashMap<String, serde_json::Value>,
    pub commands: HashMap<String, Command>,
    pub feedback: HashMap<String, Feedback>,
    pub evidence: Vec<Evidence>,
    pub agent_outputs: HashMap<String, serde_json::Value>,
    pub route: Option<Route>,
    pub metrics: Metrics,
    pub final_result: Option<FinalResult>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_feedback(mut self, agent: impl Into<String>, feedback: Feedback) -> Self {
        self.feedback.insert(agent.into(), feedback);
        self
    }

    pub fn with_command(mut self, agent: impl Into<String>, command: Command) -> Self {
        self.commands.insert(agent.into(), command);
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_final_result(mut self, result: FinalResult) -> Self {
        self.final_result = Some(result);
        self
    }
}

/// Tunable evidence-diversity floor enforced when `final_result` is set
/// (`evidence_source_kind_minimum`, default 2).
#[derive(Debug, Clone, Copy)]
pub struct EvidencePolicy {
    pub min_evidence_count: usize,
    pub min_source_kinds: usize,
}

impl Default for EvidencePolicy {
    fn default() -> Self {
        Self {
            min_evidence_count: 2,
            min_source_kinds: 2,
        }
    }
}

impl DebateState {
    /// Apply a delta atomically: either every field merges and invariants hold, or
    /// nothing is mutated and an [`StateError`] describes which invariant failed.
    pub fn apply(&mut self, delta: StateDelta, policy: EvidencePolicy) -> Result<(), StateError> {
        // Validate before mutating so a rejected delta leaves `self` untouched.
        if let Some(ref route) = delta.route {
            if !self.route.current_phase.can_transition_to(route.current_phase) {
                return Err(StateError::InvalidPhaseTransition {
                    from: self.route.current_phase.to_string(),
                    to: route.current_phase.to_string(),
                });
            }
        }

        if self.final_result.is_some() && delta.final_result.is_some() {
            return Err(StateError::FinalResultAlreadySet);
        }

        // Evidence ids visible after merging this delta's own evidence additions.
        let mut known_ids: HashSet<_> = self.evidence.iter().map(|e| e.evidence_id).collect();
        known_ids.extend(delta.evidence.iter().map(|e| e.evidence_id));

        let mut unknown = Vec::new();
        for fb in delta.feedback.values() {
            for id in &fb.evidence_refs {
                if !known_ids.contains(id) {
                    unknown.push(id.to_string());
                }
            }
        }
        if let Some(ref result) = delta.final_result {
            for id in &result.evidence_chain {
                if !known_ids.contains(id) {
                    unknown.push(id.to_string());
                }
            }
        }
        if !unknown.is_empty() {
            return Err(StateError::UnknownEvidenceIds(unknown));
        }

        // final_result needs >= min_evidence_count items spanning >= min_source_kinds.
        if let Some(ref result) = delta.final_result {
            let mut all_evidence = self.evidence.clone();
            all_evidence.extend(delta.evidence.iter().cloned());
            let kinds: HashSet<_> = result
                .evidence_chain
                .iter()
                .filter_map(|id| all_evidence.iter().find(|e| e.evidence_id == *id))
                .map(|e| e.source_kind)
                .collect();
            if result.evidence_chain.len() < policy.min_evidence_count
                || kinds.len() < policy.min_source_kinds
            {
                return Err(StateError::InsufficientEvidenceDiversity {
                    min_count: policy.min_evidence_count,
                    min_kinds: policy.min_source_kinds,
                });
            }
        }

        // All checks passed — merge.
        let seen_ids: HashSet<_> = self.messages.iter().map(|m| m.id).collect();
        for m in delta.messages {
            if !seen_ids.contains(&m.id) {
                self.messages.push(m);
            }
        }

        for (k, v) in delta.context {
            self.context.insert(k, v);
        }

        for (k, v) in delta.commands {
            self.commands.insert(k, v);
        }

        for (k, v) in delta.feedback {
            self.feedback.insert(k, v);
        }

        let existing_ids: HashSet<_> = self.evidence.iter().map(|e| e.evidence_id).collect();
        for e in delta.evidence {
            if !existing_ids.contains(&e.evidence_id) {
                self.evidence.push(e);
            }
        }

        for (k, v) in delta.agent_outputs {
            self.agent_outputs.insert(k, v);
        }

        if let Some(route) = delta.route {
            self.route = route;
        }

        self.metrics.add_assign(&delta.metrics);

        if let Some(result) = delta.final_result {
            self.final_result = Some(result);
        }

        Ok(())
    }
}
