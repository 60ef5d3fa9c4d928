//! Deterministic phase-progression rules, evaluated in a fixed order against the
//! current phase, round completeness, and feedback confidence — retargeted from the
//! priority-sorted pattern-selection rule table of
//! `orchestrator::router::supervisor::Router::route` onto debate phase transitions.

use crate::decision::{RuleOutcome, SupervisorDecision};
use debate_state::{context_shortcuts, Command, DebateState, Phase, ToolUsage};
use std::collections::HashSet;

/// Below this confidence, a specialist's claim routes the debate into critique.
pub const CONFIDENCE_LOW: f64 = 0.4;

#[derive(Debug, Clone)]
pub struct RuleSupervisorConfig {
    pub max_rounds: u32,
    pub default_deadline_ms: u64,
}

impl Default for RuleSupervisorConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            default_deadline_ms: 60_000,
        }
    }
}

pub struct RuleSupervisor {
    config: RuleSupervisorConfig,
}

fn command(round: u32, task: &str, focus: &str, schema_id: &str, deadline_ms: u64) -> Command {
    Command {
        issued_round: round,
        task: task.to_string(),
        focus: focus.to_string(),
        expected_output_schema_id: schema_id.to_string(),
        use_tool: ToolUsage::Optional,
        tool_targets: HashSet::new(),
        deadline_ms,
    }
}

fn commands_for(round: u32, agents: &[&str], task: &str, focus: &str, schema_id: &str, deadline_ms: u64) -> std::collections::HashMap<String, Command> {
    agents
        .iter()
        .map(|name| (name.to_string(), command(round, task, focus, schema_id, deadline_ms)))
        .collect()
}

impl RuleSupervisor {
    pub fn new(config: RuleSupervisorConfig) -> Self {
        Self { config }
    }

    /// True if any specialist's feedback in `round` fell below the confidence floor.
    fn any_low_confidence(state: &DebateState, round: u32) -> bool {
        state
            .feedback
            .values()
            .any(|fb| fb.round == round && fb.confidence < CONFIDENCE_LOW)
    }

    /// Heuristic conflict detector: two specialists citing the *same* evidence item
    /// with confidence levels far enough apart that they are unlikely to agree on
    /// what it implies, resolved here as a same-citation / diverging-confidence check.
    fn any_conflicting_claims(state: &DebateState, round: u32) -> bool {
        let round_feedback: Vec<_> = state.feedback.values().filter(|fb| fb.round == round).collect();
        for (i, a) in round_feedback.iter().enumerate() {
            for b in &round_feedback[i + 1..] {
                let shares_evidence = a.evidence_refs.intersection(&b.evidence_refs).next().is_some();
                if shares_evidence && (a.confidence - b.confidence).abs() >= 0.3 {
                    return true;
                }
            }
        }
        false
    }

    /// True once every specialist's feedback for `round` leaves no open question —
    /// the judge-readiness heuristic.
    fn judge_ready(state: &DebateState, round: u32) -> bool {
        state
            .feedback
            .values()
            .filter(|fb| fb.round == round)
            .all(|fb| fb.open_questions.is_empty())
    }

    /// Agents the critic challenged this round, read from `CriticAgent`'s structured
    /// output (`challenged_agents: [name, ...]`), empty if the critic hasn't run yet.
    fn challenged_agents(state: &DebateState) -> Vec<String> {
        state
            .agent_outputs
            .get("CriticAgent")
            .and_then(|v| v.get("challenged_agents"))
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn decide(&self, state: &DebateState, round: u32) -> RuleOutcome {
        let deadline = self.config.default_deadline_ms;
        match state.route.current_phase {
            Phase::AssetMapping => {
                if context_shortcuts::has_usable_asset_mapping(state) {
                    let agents = ["LogAgent", "DomainAgent", "CodeAgent"];
                    RuleOutcome::Transition(SupervisorDecision {
                        next_phase: Phase::Analysis,
                        next_agents: agents.iter().map(|s| s.to_string()).collect(),
                        commands: commands_for(round, &agents, "investigate", "root cause analysis", "specialist_v1", deadline),
                        rationale: "asset mapping complete and usable, entering analysis".into(),
                    })
                } else {
                    RuleOutcome::Defer
                }
            }
            Phase::Analysis => {
                if !state.round_complete(round) {
                    return RuleOutcome::Defer;
                }
                if Self::any_low_confidence(state, round) || Self::any_conflicting_claims(state, round) {
                    let agents = ["CriticAgent"];
                    RuleOutcome::Transition(SupervisorDecision {
                        next_phase: Phase::Critique,
                        next_agents: agents.iter().map(|s| s.to_string()).collect(),
                        commands: commands_for(round + 1, &agents, "challenge", "weakest or conflicting claims", "critique_v1", deadline),
                        rationale: "low confidence or conflicting claims in analysis, entering critique".into(),
                    })
                } else {
                    RuleOutcome::Transition(SupervisorDecision {
                        next_phase: Phase::Judgment,
                        next_agents: vec!["JudgeAgent".to_string()],
                        commands: commands_for(round + 1, &["JudgeAgent"], "adjudicate", "final root cause", "judgment_v1", deadline),
                        rationale: "analysis round complete with no conflicts, entering judgment".into(),
                    })
                }
            }
            Phase::Critique => {
                if !state.round_complete(round) {
                    return RuleOutcome::Defer;
                }
                let challenged = Self::challenged_agents(state);
                let agents: Vec<&str> = if challenged.is_empty() {
                    vec!["LogAgent"]
                } else {
                    challenged.iter().map(String::as_str).collect()
                };
                RuleOutcome::Transition(SupervisorDecision {
                    next_phase: Phase::Rebuttal,
                    next_agents: agents.iter().map(|s| s.to_string()).collect(),
                    commands: commands_for(round + 1, &agents, "respond to critique", "reinforce or revise your claim", "rebuttal_v1", deadline),
                    rationale: "critique round complete, entering rebuttal".into(),
                })
            }
            Phase::Rebuttal => {
                if !state.round_complete(round) {
                    return RuleOutcome::Defer;
                }
                if state.route.loop_round >= self.config.max_rounds || Self::judge_ready(state, round) {
                    RuleOutcome::Transition(SupervisorDecision {
                        next_phase: Phase::Judgment,
                        next_agents: vec!["JudgeAgent".to_string()],
                        commands: commands_for(round + 1, &["JudgeAgent"], "adjudicate", "final root cause", "judgment_v1", deadline),
                        rationale: "rebuttal round resolved open questions or hit max rounds, entering judgment".into(),
                    })
                } else {
                    let agents = ["CriticAgent"];
                    RuleOutcome::Transition(SupervisorDecision {
                        next_phase: Phase::Critique,
                        next_agents: agents.iter().map(|s| s.to_string()).collect(),
                        commands: commands_for(round + 1, &agents, "challenge", "remaining open questions", "critique_v1", deadline),
                        rationale: "rebuttal left open questions, looping back to critique".into(),
                    })
                }
            }
            Phase::Judgment => {
                if !state.round_complete(round) {
                    return RuleOutcome::Defer;
                }
                RuleOutcome::Transition(SupervisorDecision {
                    next_phase: Phase::Verification,
                    next_agents: vec!["VerificationAgent".to_string()],
                    commands: commands_for(round + 1, &["VerificationAgent"], "verify", "adjudicated root cause", "verification_v1", deadline),
                    rationale: "judgment complete, entering verification".into(),
                })
            }
            Phase::Verification => {
                if !state.round_complete(round) {
                    return RuleOutcome::Defer;
                }
                RuleOutcome::Transition(SupervisorDecision {
                    next_phase: Phase::Report,
                    next_agents: Vec::new(),
                    commands: Default::default(),
                    rationale: "verification complete, entering report".into(),
                })
            }
            Phase::Report => RuleOutcome::Transition(SupervisorDecision {
                next_phase: Phase::Terminal,
                next_agents: Vec::new(),
                commands: Default::default(),
                rationale: "report rendered, debate terminal".into(),
            }),
            Phase::Init | Phase::Terminal => RuleOutcome::Defer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_state::{context_keys, Feedback, FeedbackStatus};

    fn state_with_confidences(phase: Phase, confidences: &[f64]) -> DebateState {
        let mut state = DebateState::new();
        state.route.current_phase = phase;
        for (i, confidence) in confidences.iter().enumerate() {
            let name = format!("Agent{i}");
            state.commands.insert(
                name.clone(),
                command(1, "x", "y", "s", 1000),
            );
            state.feedback.insert(
                name,
                Feedback {
                    round: 1,
                    status: FeedbackStatus::Ok,
                    summary: "x".into(),
                    evidence_refs: Default::default(),
                    confidence: *confidence,
                    missing_info: vec![],
                    open_questions: vec![],
                },
            );
        }
        state
    }

    #[test]
    fn defers_in_asset_mapping_without_a_usable_mapping() {
        let supervisor = RuleSupervisor::new(RuleSupervisorConfig::default());
        let state = DebateState::new();
        assert!(matches!(supervisor.decide(&state, 0), RuleOutcome::Defer));
    }

    #[test]
    fn transitions_to_analysis_once_mapping_is_usable() {
        let supervisor = RuleSupervisor::new(RuleSupervisorConfig::default());
        let mut state = DebateState::new();
        state.route.current_phase = Phase::AssetMapping;
        state
            .context
            .insert(context_keys::ASSET_MAPPING.to_string(), serde_json::json!({"svc": "checkout"}));

        match supervisor.decide(&state, 0) {
            RuleOutcome::Transition(decision) => assert_eq!(decision.next_phase, Phase::Analysis),
            RuleOutcome::Defer => panic!("expected a transition"),
        }
    }

    #[test]
    fn low_confidence_analysis_routes_to_critique() {
        let supervisor = RuleSupervisor::new(RuleSupervisorConfig::default());
        let state = state_with_confidences(Phase::Analysis, &[0.2, 0.9]);

        match supervisor.decide(&state, 1) {
            RuleOutcome::Transition(decision) => assert_eq!(decision.next_phase, Phase::Critique),
            RuleOutcome::Defer => panic!("expected a transition"),
        }
    }

    #[test]
    fn confident_analysis_routes_directly_to_judgment() {
        let supervisor = RuleSupervisor::new(RuleSupervisorConfig::default());
        let state = state_with_confidences(Phase::Analysis, &[0.8, 0.9]);

        match supervisor.decide(&state, 1) {
            RuleOutcome::Transition(decision) => assert_eq!(decision.next_phase, Phase::Judgment),
            RuleOutcome::Defer => panic!("expected a transition"),
        }
    }

    #[test]
    fn incomplete_round_defers() {
        let supervisor = RuleSupervisor::new(RuleSupervisorConfig::default());
        let mut state = DebateState::new();
        state.route.current_phase = Phase::Analysis;
        state.commands.insert("LogAgent".into(), command(1, "x", "y", "s", 1000));
        assert!(matches!(supervisor.decide(&state, 1), RuleOutcome::Defer));
    }
}
