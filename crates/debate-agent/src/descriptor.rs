//! The ten registered debate specialists: log, code, domain, metrics, change, runbook,
//! critic, rebuttal, judge, verification. The registry shape follows
//! `pattern::registry`'s dynamic-pattern-instantiation idiom, generalized here to agent
//! descriptors so `debate-graph` can generate one `agent_<name>_node` per entry without
//! hand-written per-specialist node types.

use debate_llm::RetryProfile;
use debate_state::Phase;
use std::collections::HashMap;

/// One registered specialist: a fixed system prompt, the phase(s) it is active in, and
/// which [`RetryProfile`] its LLM calls use. Judge/verification get the long-timeout/
/// low-retry profile; everyone else gets the analysis profile.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub system_prompt: String,
    pub active_phases: Vec<Phase>,
    pub is_judge_like: bool,
}

impl AgentDescriptor {
    pub fn retry_profile(&self) -> RetryProfile {
        if self.is_judge_like {
            RetryProfile::judge()
        } else {
            RetryProfile::analysis()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentDescriptor>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: AgentDescriptor) {
        self.agents.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    /// The ten standard specialists, with system prompts terse enough to leave room
    /// in the prompt budget for incident context.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let specialists: &[(&str, &str, &[Phase], bool)] = &[
            (
                "LogAgent",
                "You are the log analysis specialist. Examine the incident's log excerpt for error signatures, stack traces, and anomalous timing. Cite every claim with a source_ref pointing at a specific log line.",
                &[Phase::Analysis, Phase::Critique, Phase::Rebuttal],
                false,
            ),
            (
                "CodeAgent",
                "You are the code specialist. Examine recent changes and source structure for defects consistent with the incident symptoms. Cite every claim with a source_ref pointing at a file/commit.",
                &[Phase::Analysis, Phase::Critique, Phase::Rebuttal],
                false,
            ),
            (
                "DomainAgent",
                "You are the domain specialist. Map the incident onto the affected service's architecture and known failure domains. Cite every claim with a source_ref to the domain model entry used.",
                &[Phase::AssetMapping, Phase::Analysis, Phase::Critique, Phase::Rebuttal],
                false,
            ),
            (
                "MetricsAgent",
                "You are the metrics specialist. Correlate the incident window against available metric series for saturation or error-rate signals. Cite every claim with a source_ref to the metric name and window.",
                &[Phase::Analysis, Phase::Critique, Phase::Rebuttal],
                false,
            ),
            (
                "ChangeAgent",
                "You are the change specialist. Identify deploys, config changes, or feature flag flips within the incident window that could explain the symptoms. Cite every claim with a source_ref to the change record.",
                &[Phase::Analysis, Phase::Critique, Phase::Rebuttal],
                false,
            ),
            (
                "RunbookAgent",
                "You are the runbook specialist. Match the incident against known case-library entries and prior postmortems. Cite every claim with a source_ref to the runbook entry.",
                &[Phase::Analysis, Phase::Critique, Phase::Rebuttal],
                false,
            ),
            (
                "CriticAgent",
                "You are the critic. Challenge the weakest or most conflicting claims made so far; name the specific agent and claim you are disputing and why.",
                &[Phase::Critique],
                false,
            ),
            (
                "RebuttalAgent",
                "You respond to a critic's challenge against your own prior claim. Either reinforce it with new evidence or concede and revise it.",
                &[Phase::Rebuttal],
                false,
            ),
            (
                "JudgeAgent",
                "You are the judge. Weigh all specialist evidence and produce a single adjudicated \
                 conclusion as a JSON object with fields root_cause, confidence, impact, \
                 fix_recommendation, verification_plan, and risk_level (one of low/medium/high/critical). \
                 Cite at least two pieces of evidence from at least two distinct source kinds in your \
                 evidence array; an unsupported conclusion will be rejected.",
                &[Phase::Judgment],
                true,
            ),
            (
                "VerificationAgent",
                "You are the verification specialist. Propose a concrete verification plan for the judge's adjudicated root cause and flag any remaining risk.",
                &[Phase::Verification],
                true,
            ),
        ];

        for (name, prompt, phases, is_judge_like) in specialists {
            registry.register(AgentDescriptor {
                name: (*name).to_string(),
                system_prompt: (*prompt).to_string(),
                active_phases: phases.to_vec(),
                is_judge_like: *is_judge_like,
            });
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_ten_specialists() {
        let registry = AgentRegistry::standard();
        assert_eq!(registry.names().count(), 10);
    }

    #[test]
    fn judge_and_verification_use_the_long_timeout_profile() {
        let registry = AgentRegistry::standard();
        assert!(registry.get("JudgeAgent").unwrap().retry_profile().max_retries <= 1);
        assert!(registry.get("VerificationAgent").unwrap().is_judge_like);
        assert!(!registry.get("LogAgent").unwrap().is_judge_like);
    }
}
