//! Gate rejection: fails with `ToolCapabilityDenied` when any gate stage rejects.

use crate::kind::ToolKind;
use debate_state::Severity;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool {tool} is disabled in session configuration")]
    Disabled { tool: ToolKind },

    #[error("command forbids tool use for this turn")]
    ForbiddenByCommand { tool: ToolKind },

    #[error("command's tool_targets does not list {tool}")]
    NotTargeted { tool: ToolKind },

    #[error("agent {agent_name} is not allow-listed for {tool}")]
    NotAllowListed { tool: ToolKind, agent_name: String },
}

impl ToolError {
    pub fn severity(&self) -> Severity {
        Severity::Transient
    }
}
