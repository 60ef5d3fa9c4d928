//! The three-stage capability gate: (1) tool enabled in global config;
//! (2) the command's `use_tool`/`tool_targets` permit invocation; (3) the agent is
//! allow-listed for the tool. Composition logic is new; the config shape it operates
//! over follows the `PolicyRegistry`/allow-list pattern in `tooling::runtime::policy`.

use crate::error::ToolError;
use crate::kind::ToolKind;
use debate_state::{Command, ToolUsage};
use std::collections::{HashMap, HashSet};

/// Per-session tool policy snapshot: `tools_enabled: per-tool boolean`, plus an
/// allow-list keyed by agent name.
#[derive(Debug, Clone)]
pub struct ToolPolicy {
    pub enabled: HashMap<ToolKind, bool>,
    pub allow_list: HashMap<ToolKind, HashSet<String>>,
}

impl Default for ToolPolicy {
    /// All six tools enabled, no agent restricted — the permissive baseline a session
    /// config narrows from.
    fn default() -> Self {
        let enabled = ToolKind::ALL.iter().map(|k| (*k, true)).collect();
        Self {
            enabled,
            allow_list: HashMap::new(),
        }
    }
}

impl ToolPolicy {
    pub fn is_enabled(&self, tool: ToolKind) -> bool {
        self.enabled.get(&tool).copied().unwrap_or(false)
    }

    pub fn set_enabled(&mut self, tool: ToolKind, enabled: bool) {
        self.enabled.insert(tool, enabled);
    }

    /// Restrict a tool to a fixed set of agent names. An unrestricted tool (no entry)
    /// allows every agent.
    pub fn restrict_to(&mut self, tool: ToolKind, agents: impl IntoIterator<Item = String>) {
        self.allow_list.insert(tool, agents.into_iter().collect());
    }

    fn is_allow_listed(&self, tool: ToolKind, agent_name: &str) -> bool {
        match self.allow_list.get(&tool) {
            Some(allowed) => allowed.contains(agent_name),
            None => true,
        }
    }

    /// Evaluate all three gate stages for one `(tool, command, agent)` triple.
    /// `required_tool_context` is true when the command mandates tool use before any
    /// LLM call.
    pub fn gate(&self, tool: ToolKind, command: &Command, agent_name: &str) -> Result<(), ToolError> {
        if !self.is_enabled(tool) {
            return Err(ToolError::Disabled { tool });
        }
        match command.use_tool {
            ToolUsage::Forbidden => return Err(ToolError::ForbiddenByCommand { tool }),
            ToolUsage::Required | ToolUsage::Optional => {
                if !command.tool_targets.is_empty() && !command.tool_targets.contains(tool.as_str()) {
                    return Err(ToolError::NotTargeted { tool });
                }
            }
        }
        if !self.is_allow_listed(tool, agent_name) {
            return Err(ToolError::NotAllowListed {
                tool,
                agent_name: agent_name.to_string(),
            });
        }
        Ok(())
    }
}
