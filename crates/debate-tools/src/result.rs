//! `ToolResult` and audit record shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Ok,
    Disabled,
    Unavailable,
    Skipped,
    SkippedByCommand,
    Error,
}

/// One append-only audit record, produced for every invocation attempt regardless of
/// outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub status: ToolStatus,
    pub parameters_redacted: serde_json::Value,
    pub outcome_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    pub summary: String,
    /// Size-bounded preview safe to embed directly into an LLM prompt.
    pub data_preview: serde_json::Value,
    pub data_full: serde_json::Value,
    pub audit: Vec<AuditRecord>,
}

impl ToolResult {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Skipped,
            summary: reason.into(),
            data_preview: serde_json::Value::Null,
            data_full: serde_json::Value::Null,
            audit: Vec::new(),
        }
    }

    pub fn skipped_by_command(reason: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::SkippedByCommand,
            summary: reason.into(),
            data_preview: serde_json::Value::Null,
            data_full: serde_json::Value::Null,
            audit: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            status: ToolStatus::Disabled,
            summary: "tool disabled in session configuration".into(),
            data_preview: serde_json::Value::Null,
            data_full: serde_json::Value::Null,
            audit: Vec::new(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Unavailable,
            summary: reason.into(),
            data_preview: serde_json::Value::Null,
            data_full: serde_json::Value::Null,
            audit: Vec::new(),
        }
    }
}
