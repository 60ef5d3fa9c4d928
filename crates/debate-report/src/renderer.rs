//! The Report Service collaborator seam: delegates to an external report renderer
//! with the structured final_result. Grounded in the `LlmClient`/`Tool`
//! external-collaborator trait shape used across this workspace
//! (`debate_llm::LlmClient`, `debate_tools::Tool`).

use async_trait::async_trait;
use debate_state::FinalResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("report rendering failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, final_result: &FinalResult) -> Result<ReportDocument, RenderError>;
}

/// A minimal reference renderer producing a plain-text document, useful as a
/// default before an embedder wires in a real templating/Report Service backend.
pub struct PlainTextRenderer;

#[async_trait]
impl ReportRenderer for PlainTextRenderer {
    async fn render(&self, final_result: &FinalResult) -> Result<ReportDocument, RenderError> {
        let body = format!(
            "Root cause: {}\nConfidence: {:.2}\nImpact: {}\nRecommended fix: {}\nVerification plan: {}\nRisk: {:?}\n",
            final_result.root_cause,
            final_result.confidence,
            final_result.impact,
            final_result.fix_recommendation,
            final_result.verification_plan,
            final_result.risk_level,
        );
        Ok(ReportDocument {
            title: format!("Root Cause Analysis: {}", final_result.root_cause),
            body,
        })
    }
}
