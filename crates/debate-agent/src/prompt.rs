//! Prompt construction: fixed system prompt + rolling condensed context + pending
//! command + schema instruction, tokenizer-approximated truncation from the oldest
//! segment. Command and schema sections are never truncated.

use crate::descriptor::AgentDescriptor;
use debate_llm::ChatMessage;
use debate_state::{context_shortcuts, Command, DebateState, Phase};

/// Recent-message window size: the last 6 messages.
pub const RECENT_MESSAGE_WINDOW: usize = 6;

/// A char-based proxy for token count (roughly 4 chars/token for English prose),
/// favoring a cheap approximation over a real
/// tokenizer dependency where exactness isn't load-bearing.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 8_000;

pub struct PromptBuilder {
    max_prompt_chars: usize,
    recent_message_window: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            recent_message_window: RECENT_MESSAGE_WINDOW,
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    /// True if `phase` is within one step of `around` in the debate's fixed ordering —
    /// used to decide which prior messages are relevant context for this turn, kept
    /// to this agent's phase and adjacent phases.
    fn is_adjacent_phase(phase: Phase, around: Phase) -> bool {
        use Phase::*;
        const ORDER: [Phase; 9] = [
            Init, AssetMapping, Analysis, Critique, Rebuttal, Judgment, Verification, Report,
            Terminal,
        ];
        let rank = |p: Phase| ORDER.iter().position(|x| *x == p).unwrap_or(0);
        let a = rank(phase);
        let b = rank(around);
        a.abs_diff(b) <= 1
    }

    pub fn build(
        &self,
        descriptor: &AgentDescriptor,
        state: &DebateState,
        current_phase: Phase,
        command: &Command,
        tool_summaries: &[String],
    ) -> Vec<ChatMessage> {
        // Fixed, never-truncated sections.
        let system_prompt = descriptor.system_prompt.clone();
        let command_section = format!(
            "Current command:\ntask: {}\nfocus: {}\nexpected_output_schema_id: {}\ndeadline_ms: {}\n\
             Respond with a JSON object matching the expected schema. Include an \"evidence\" array of \
             {{source_kind, source_ref, description, strength}} for every cited claim.",
            command.task, command.focus, command.expected_output_schema_id, command.deadline_ms
        );

        // Truncatable sections, built oldest-first so the front can be dropped.
        let mut truncatable = Vec::new();
        if let Some(summary) = context_shortcuts::incident_summary(state) {
            truncatable.push(format!("Incident summary:\n{summary}"));
        }
        if let Some(mapping) = context_shortcuts::asset_mapping(state) {
            truncatable.push(format!("Asset mapping:\n{mapping}"));
        }
        if let Some(summary) = context_shortcuts::accumulated_summary(state) {
            truncatable.push(format!("Accumulated debate summary:\n{summary}"));
        }
        if !tool_summaries.is_empty() {
            truncatable.push(format!("Tool results:\n{}", tool_summaries.join("\n---\n")));
        }

        let recent_messages: Vec<_> = state
            .messages
            .iter()
            .rev()
            .filter(|m| Self::is_adjacent_phase(m.phase, current_phase))
            .take(self.recent_message_window)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if !recent_messages.is_empty() {
            let transcript = recent_messages
                .iter()
                .map(|m| {
                    let role = match m.role {
                        debate_state::Role::Supervisor => "supervisor",
                        debate_state::Role::Specialist => "specialist",
                        debate_state::Role::System => "system",
                    };
                    format!("[{}/{}] {}: {}", m.phase, role, m.agent_name, m.content)
                })
                .collect::<Vec<_>>()
                .join("\n");
            truncatable.push(format!("Recent messages:\n{transcript}"));
        }

        let fixed_len = system_prompt.len() + command_section.len();
        let mut budget = self.max_prompt_chars.saturating_sub(fixed_len);
        let mut kept = Vec::with_capacity(truncatable.len());
        // Keep newest-first within the budget, then restore chronological order.
        for segment in truncatable.into_iter().rev() {
            if segment.len() <= budget {
                budget -= segment.len();
                kept.push(segment);
            }
        }
        kept.reverse();

        let mut user_content = kept.join("\n\n");
        if !user_content.is_empty() {
            user_content.push_str("\n\n");
        }
        user_content.push_str(&command_section);

        vec![ChatMessage::system(system_prompt), ChatMessage::user(user_content)]
    }
}
