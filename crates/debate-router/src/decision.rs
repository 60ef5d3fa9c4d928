//! The supervisor's decision shape: which agents to command next, what each is
//! commanded to do, and the target phase that decision moves the debate into.

use debate_state::{Command, Phase};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SupervisorDecision {
    pub next_phase: Phase,
    pub next_agents: Vec<String>,
    pub commands: HashMap<String, Command>,
    pub rationale: String,
}

/// What the rule-based supervisor produced for a given state: either a confident
/// transition, or a deferral to the LLM-dynamic layer.
#[derive(Debug, Clone)]
pub enum RuleOutcome {
    Transition(SupervisorDecision),
    Defer,
}

/// Session config's `supervisor_mode` knob: `rule`, `llm`, or `hybrid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorMode {
    Rule,
    Llm,
    #[default]
    Hybrid,
}

impl std::str::FromStr for SupervisorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(Self::Rule),
            "llm" => Ok(Self::Llm),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("unknown supervisor_mode: {other}")),
        }
    }
}
