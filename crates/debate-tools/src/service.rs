//! Tool Context Service: gates, invokes, audits, and reports every tool call a
//! specialist makes.

use crate::error::ToolError;
use crate::kind::ToolKind;
use crate::policy::ToolPolicy;
use crate::redact::{default_preview, redact_params};
use crate::result::{AuditRecord, ToolResult, ToolStatus};
use crate::tool::Tool;
use debate_events::{EventDispatcher, EventType};
use debate_state::{Clock, Command, Phase, SessionId};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ToolContextService {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
    policy: ToolPolicy,
    dispatcher: Arc<EventDispatcher>,
}

impl ToolContextService {
    pub fn new(policy: ToolPolicy, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            tools: HashMap::new(),
            policy,
            dispatcher,
        }
    }

    pub fn register(&mut self, kind: ToolKind, tool: Arc<dyn Tool>) {
        self.tools.insert(kind, tool);
    }

    pub fn policy(&self) -> &ToolPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut ToolPolicy {
        &mut self.policy
    }

    fn gate_status(err: &ToolError) -> ToolStatus {
        match err {
            ToolError::Disabled { .. } => ToolStatus::Disabled,
            ToolError::ForbiddenByCommand { .. } | ToolError::NotTargeted { .. } => {
                ToolStatus::SkippedByCommand
            }
            ToolError::NotAllowListed { .. } => ToolStatus::Skipped,
        }
    }

    /// Gate, invoke, audit, and emit one `agent_tool_io` event for a single tool call.
    #[allow(clippy::too_many_arguments)]
    pub async fn invoke(
        &self,
        session_id: SessionId,
        phase: Phase,
        command: &Command,
        agent_name: &str,
        tool: ToolKind,
        params: serde_json::Value,
        clock: &dyn Clock,
    ) -> ToolResult {
        let timestamp = clock.now();
        let redacted_params = redact_params(&params);

        let mut result = if let Err(gate_err) = self.policy.gate(tool, command, agent_name) {
            let status = Self::gate_status(&gate_err);
            let audit = AuditRecord {
                timestamp,
                action: tool.to_string(),
                status,
                parameters_redacted: redacted_params.clone(),
                outcome_summary: gate_err.to_string(),
            };
            ToolResult {
                status,
                summary: gate_err.to_string(),
                data_preview: serde_json::Value::Null,
                data_full: serde_json::Value::Null,
                audit: vec![audit],
            }
        } else {
            match self.tools.get(&tool) {
                Some(implementation) => {
                    let mut result = implementation.invoke(params).await;
                    let audit = AuditRecord {
                        timestamp,
                        action: tool.to_string(),
                        status: result.status,
                        parameters_redacted: redacted_params.clone(),
                        outcome_summary: result.summary.clone(),
                    };
                    result.data_preview = default_preview(&result.data_full);
                    result.audit.push(audit);
                    result
                }
                None => {
                    let summary = format!("{tool} has no registered implementation");
                    let audit = AuditRecord {
                        timestamp,
                        action: tool.to_string(),
                        status: ToolStatus::Unavailable,
                        parameters_redacted: redacted_params.clone(),
                        outcome_summary: summary.clone(),
                    };
                    ToolResult {
                        status: ToolStatus::Unavailable,
                        summary,
                        data_preview: serde_json::Value::Null,
                        data_full: serde_json::Value::Null,
                        audit: vec![audit],
                    }
                }
            }
        };
        if result.audit.is_empty() {
            result.audit.push(AuditRecord {
                timestamp,
                action: tool.to_string(),
                status: result.status,
                parameters_redacted: redacted_params,
                outcome_summary: result.summary.clone(),
            });
        }

        self.dispatcher.emit(
            session_id,
            EventType::AgentToolIo {
                agent_name: agent_name.to_string(),
                tool: tool.to_string(),
                status: format!("{:?}", result.status).to_lowercase(),
                summary: result.summary.clone(),
            },
            Some(phase),
            Some(agent_name.to_string()),
            clock,
        );

        result
    }

    /// Announce which tools will be consulted before the agent's LLM call, emitting
    /// `agent_tool_context_prepared`.
    pub fn announce_context(
        &self,
        session_id: SessionId,
        phase: Phase,
        agent_name: &str,
        tools: &[ToolKind],
        clock: &dyn Clock,
    ) {
        self.dispatcher.emit(
            session_id,
            EventType::AgentToolContextPrepared {
                agent_name: agent_name.to_string(),
                tools: tools.iter().map(|t| t.to_string()).collect(),
            },
            Some(phase),
            Some(agent_name.to_string()),
            clock,
        );
    }
}
