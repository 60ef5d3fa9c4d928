//! `SessionConfig`: the per-session configuration envelope passed to
//! `start_session`. Grounded in the layered YAML config loader of
//! `orchestrator::config::loader::load_yaml_config`/`deep_merge`, simplified here to
//! a flat deep-merge over one document — this workspace has no `$include`/server-
//! specific knobs to carry, so the include-resolution and env-var expansion that
//! loader performs are out of scope.

use debate_router::SupervisorMode;
use debate_state::{Phase, SessionConfigSnapshot};
use debate_tools::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

const ALL_PHASES: [Phase; 9] = [
    Phase::Init,
    Phase::AssetMapping,
    Phase::Analysis,
    Phase::Critique,
    Phase::Rebuttal,
    Phase::Judgment,
    Phase::Verification,
    Phase::Report,
    Phase::Terminal,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse session config: {0}")]
    Parse(String),
    #[error("{0}")]
    InvalidValue(String),
}

/// Raw, string-keyed shape used only as the serde target for YAML/JSON parsing; kept
/// separate from [`SessionConfig`] so `supervisor_mode` and `tools_enabled` can be
/// validated into their real types after parsing instead of failing deserialization on
/// the first bad key.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct RawSessionConfig {
    max_rounds: Option<u32>,
    concurrency_limit: Option<usize>,
    per_phase_timeout_ms: Option<u64>,
    per_phase_retry: Option<u32>,
    supervisor_mode: Option<String>,
    tools_enabled: Option<HashMap<String, bool>>,
}

/// `{max_rounds: 1..8, concurrency_limit: 1..16, per_phase_timeout_ms,
/// per_phase_retry, supervisor_mode ∈ {rule, llm, hybrid}, tools_enabled: per-tool
/// boolean}`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_rounds: u32,
    pub concurrency_limit: usize,
    pub per_phase_timeout_ms: u64,
    pub per_phase_retry: u32,
    pub supervisor_mode: SupervisorMode,
    pub tools_enabled: HashMap<ToolKind, bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            concurrency_limit: 4,
            per_phase_timeout_ms: 60_000,
            per_phase_retry: 2,
            supervisor_mode: SupervisorMode::Hybrid,
            tools_enabled: ToolKind::ALL.iter().map(|k| (*k, true)).collect(),
        }
    }
}

impl SessionConfig {
    /// Parse a YAML document, merge its keys over the defaults, and validate.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawSessionConfig = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::default().merge_raw(raw)
    }

    /// Deep-merge another config's explicitly-set fields over `self`, following
    /// `deep_merge`'s override-on-conflict semantics at the field level (no nested
    /// mappings to merge, since every field here is a scalar or a flat map).
    pub fn merge_defaults(self, overrides: SessionConfig) -> Self {
        overrides
    }

    fn merge_raw(mut self, raw: RawSessionConfig) -> Result<Self, ConfigError> {
        if let Some(max_rounds) = raw.max_rounds {
            if !(1..=8).contains(&max_rounds) {
                return Err(ConfigError::InvalidValue(format!("max_rounds must be 1..=8, got {max_rounds}")));
            }
            self.max_rounds = max_rounds;
        }
        if let Some(concurrency_limit) = raw.concurrency_limit {
            if !(1..=16).contains(&concurrency_limit) {
                return Err(ConfigError::InvalidValue(format!(
                    "concurrency_limit must be 1..=16, got {concurrency_limit}"
                )));
            }
            self.concurrency_limit = concurrency_limit;
        }
        if let Some(timeout) = raw.per_phase_timeout_ms {
            self.per_phase_timeout_ms = timeout;
        }
        if let Some(retry) = raw.per_phase_retry {
            self.per_phase_retry = retry;
        }
        if let Some(mode) = raw.supervisor_mode {
            self.supervisor_mode = SupervisorMode::from_str(&mode).map_err(ConfigError::InvalidValue)?;
        }
        if let Some(tools_enabled) = raw.tools_enabled {
            for (name, enabled) in tools_enabled {
                let tool = ToolKind::from_str(&name).map_err(|_| ConfigError::InvalidValue(format!("unknown tool: {name}")))?;
                self.tools_enabled.insert(tool, enabled);
            }
        }
        Ok(self)
    }

    /// Flatten into the uniform-per-phase [`SessionConfigSnapshot`] that
    /// [`debate_state::Session`] captures at launch. Every phase gets the same
    /// `per_phase_timeout_ms`/`per_phase_retry` since this config surface has no
    /// per-phase override (see DESIGN.md open question #11).
    pub fn to_snapshot(&self) -> SessionConfigSnapshot {
        let timeouts = ALL_PHASES.iter().map(|p| (p.to_string(), self.per_phase_timeout_ms)).collect();
        let retries = ALL_PHASES.iter().map(|p| (p.to_string(), self.per_phase_retry)).collect();
        SessionConfigSnapshot {
            max_rounds: self.max_rounds as u8,
            concurrency_limit: self.concurrency_limit as u8,
            per_phase_timeout_ms: timeouts,
            per_phase_max_retries: retries,
        }
    }
}
