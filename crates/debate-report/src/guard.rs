//! Report Guard: validates `final_result` against the
//! effective-conclusion rules before a session is allowed to reach `report`/
//! `terminal`. Grounded in the `GuardConfig`/`TerminationCondition::Contains`
//! pattern of `orchestrator::config::router` — retargeted from "should the router keep
//! iterating" onto "is this conclusion good enough to ship".

use debate_state::{DebateState, EvidencePolicy, FinalResult};
use std::collections::HashSet;
use thiserror::Error;

/// Phrases that indicate the debate produced no real conclusion. Case-insensitive
/// substring match.
pub fn default_blocked_phrases() -> Vec<String> {
    vec![
        "insufficient information".to_string(),
        "needs further analysis".to_string(),
        "unknown".to_string(),
    ]
}

#[derive(Debug, Clone)]
pub struct ReportGuardConfig {
    pub blocked_phrases: Vec<String>,
    pub evidence_policy: EvidencePolicy,
}

impl Default for ReportGuardConfig {
    fn default() -> Self {
        Self {
            blocked_phrases: default_blocked_phrases(),
            evidence_policy: EvidencePolicy::default(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GuardError {
    #[error("no final_result has been set")]
    Missing,

    #[error("root_cause is empty or matches a blocked phrase: {matched_phrase:?}")]
    BlockedConclusion { matched_phrase: Option<String> },

    #[error("confidence must be > 0, got {0}")]
    NonPositiveConfidence(f64),

    #[error("evidence chain has {count} item(s) spanning {kinds} source kind(s), need >= {min_count} spanning >= {min_kinds}")]
    InsufficientDiversity {
        count: usize,
        kinds: usize,
        min_count: usize,
        min_kinds: usize,
    },
}

impl GuardError {
    /// The caller-facing retry hint.
    pub fn retry_hint(&self) -> &'static str {
        match self {
            GuardError::Missing => "no conclusion was reached; retry the judgment and verification phases",
            GuardError::BlockedConclusion { .. } => {
                "the conclusion was a non-answer; retry with additional specialist rounds"
            }
            GuardError::NonPositiveConfidence(_) => {
                "the adjudicated confidence was zero; retry judgment with stronger evidence requirements"
            }
            GuardError::InsufficientDiversity { .. } => {
                "the evidence chain lacks source diversity; retry analysis to gather corroborating evidence"
            }
        }
    }

    pub const ERROR_CODE: &'static str = "NO_VALID_CONCLUSION";
}

pub struct ReportGuard {
    config: ReportGuardConfig,
}

impl ReportGuard {
    pub fn new(config: ReportGuardConfig) -> Self {
        Self { config }
    }

    fn blocked_phrase_match(&self, root_cause: &str) -> Option<String> {
        let lower = root_cause.to_ascii_lowercase();
        self.config
            .blocked_phrases
            .iter()
            .find(|phrase| lower.contains(&phrase.to_ascii_lowercase()))
            .cloned()
    }

    /// Validate `state.final_result` against the effective-conclusion rules,
    /// returning the validated result on success.
    pub fn validate<'a>(&self, state: &'a DebateState) -> Result<&'a FinalResult, GuardError> {
        let result = state.final_result.as_ref().ok_or(GuardError::Missing)?;

        if result.root_cause.trim().is_empty() {
            return Err(GuardError::BlockedConclusion { matched_phrase: None });
        }
        if let Some(matched) = self.blocked_phrase_match(&result.root_cause) {
            return Err(GuardError::BlockedConclusion {
                matched_phrase: Some(matched),
            });
        }
        if result.confidence <= 0.0 {
            return Err(GuardError::NonPositiveConfidence(result.confidence));
        }

        let kinds: HashSet<_> = result
            .evidence_chain
            .iter()
            .filter_map(|id| state.evidence_by_id(*id))
            .map(|e| e.source_kind)
            .collect();
        if result.evidence_chain.len() < self.config.evidence_policy.min_evidence_count
            || kinds.len() < self.config.evidence_policy.min_source_kinds
        {
            return Err(GuardError::InsufficientDiversity {
                count: result.evidence_chain.len(),
                kinds: kinds.len(),
                min_count: self.config.evidence_policy.min_evidence_count,
                min_kinds: self.config.evidence_policy.min_source_kinds,
            });
        }

        Ok(result)
    }
}
