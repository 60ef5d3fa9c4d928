//! The per-tool invocation seam.

use crate::result::ToolResult;
use async_trait::async_trait;

/// Each of the six fixed tools implements this. Implementations are supplied by the
/// embedder — `debate-runtime` ships deterministic reference tools for tests/examples.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn invoke(&self, params: serde_json::Value) -> ToolResult;
}
