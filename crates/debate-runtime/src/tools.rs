//! Deterministic reference `Tool` implementations, one per `ToolKind`, for the demo
//! binary and integration tests. Grounded in `debate-tools`'s own `EchoTool` test
//! double (`debate-tools::service` test module): a fixed canned result, no external
//! I/O, `status: Ok` unconditionally.

use async_trait::async_trait;
use debate_tools::{Tool, ToolKind, ToolResult, ToolStatus};
use serde_json::json;

/// Returns one canned `ToolResult` regardless of `params`. Each instance is scoped to
/// one `ToolKind` so the canned payload reads as a plausible answer for that tool.
pub struct NullTool {
    kind: ToolKind,
}

impl NullTool {
    pub fn new(kind: ToolKind) -> Self {
        Self { kind }
    }

    fn canned_payload(&self) -> serde_json::Value {
        match self.kind {
            ToolKind::LocalLogReader => json!({
                "matches": [
                    {"line": 1842, "text": "PANIC: could not write to file: No space left on device"},
                ],
            }),
            ToolKind::DomainTableLookup => json!({
                "service": "checkout",
                "dependencies": ["checkout-db-2", "payment-gateway"],
            }),
            ToolKind::SourceRepoSearch => json!({
                "commits": [
                    {"sha": "a1b2c3d", "message": "reduce WAL retention window for log rotation"},
                ],
            }),
            ToolKind::ChangeWindowScanner => json!({
                "changes": [
                    {"kind": "config", "ref": "logrotate.conf@a1b2c3d", "applied_at": "6h ago"},
                ],
            }),
            ToolKind::MetricsSnapshotAnalyzer => json!({
                "series": "disk.used_percent{host=checkout-db-2}",
                "trend": "61% -> 100% over 6h",
            }),
            ToolKind::RunbookCaseLibrary => json!({
                "matched_entry": "disk-pressure-checklist",
                "confidence": 0.8,
            }),
        }
    }
}

#[async_trait]
impl Tool for NullTool {
    async fn invoke(&self, _params: serde_json::Value) -> ToolResult {
        let payload = self.canned_payload();
        ToolResult {
            status: ToolStatus::Ok,
            summary: format!("{} returned a canned result", self.kind),
            data_preview: payload.clone(),
            data_full: payload,
            audit: Vec::new(),
        }
    }
}
