//! Per-phase retry profile, error classification, and backoff — adapted from
//! `executor::retry` and retargeted from "orchestrator operation" to "LLM call".

use crate::error::LlmError;
use std::time::Duration;

/// Whether a failed attempt is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
    Unknown,
}

/// Classify an [`LlmError`] for retry purposes. Configuration errors are the only
/// permanent class here; everything else (timeout, transport, malformed output) may
/// succeed on a subsequent attempt.
pub fn classify_error(error: &LlmError) -> ErrorClass {
    match error {
        LlmError::Configuration(_) => ErrorClass::Permanent,
        LlmError::Timeout { .. } | LlmError::Transport(_) | LlmError::InvalidResponse(_) => {
            ErrorClass::Transient
        }
    }
}

/// A per-phase retry profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryProfile {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
    /// If set, exhausting all retries is a fatal error rather than a degradation.
    pub fatal_on_exhaust: bool,
}

impl RetryProfile {
    /// Analysis agents: short timeout, up to 2 retries.
    pub fn analysis() -> Self {
        Self {
            timeout_ms: 60_000,
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
            jitter: true,
            fatal_on_exhaust: false,
        }
    }

    /// Judge/Verification: long timeout, up to 1 retry.
    pub fn judge() -> Self {
        Self {
            timeout_ms: 180_000,
            max_retries: 1,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
            jitter: true,
            fatal_on_exhaust: false,
        }
    }

    /// Supervisor: short timeout, 1 retry.
    pub fn supervisor() -> Self {
        Self {
            timeout_ms: 60_000,
            max_retries: 1,
            initial_backoff_ms: 500,
            max_backoff_ms: 4_000,
            backoff_multiplier: 2.0,
            jitter: true,
            fatal_on_exhaust: false,
        }
    }

    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms =
            (self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32)) as u64;
        let delay_ms = delay_ms.min(self.max_backoff_ms);
        let delay_ms = if self.jitter {
            let jitter_amount = (delay_ms as f64 * 0.25 * rand::random::<f64>()) as u64;
            delay_ms + jitter_amount
        } else {
            delay_ms
        };
        Duration::from_millis(delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_profile_matches_phase_budget() {
        let profile = RetryProfile::analysis();
        assert_eq!(profile.timeout_ms, 60_000);
        assert_eq!(profile.max_retries, 2);
    }

    #[test]
    fn judge_profile_has_longer_timeout_and_fewer_retries() {
        let profile = RetryProfile::judge();
        assert_eq!(profile.timeout_ms, 180_000);
        assert_eq!(profile.max_retries, 1);
    }

    #[test]
    fn backoff_delay_is_exponential_without_jitter() {
        let profile = RetryProfile {
            jitter: false,
            ..RetryProfile::analysis()
        };
        assert_eq!(profile.backoff_delay(0).as_millis(), 500);
        assert_eq!(profile.backoff_delay(1).as_millis(), 1000);
        assert_eq!(profile.backoff_delay(2).as_millis(), 2000);
    }

    #[test]
    fn backoff_delay_is_capped_at_max() {
        let profile = RetryProfile {
            jitter: false,
            max_backoff_ms: 1200,
            ..RetryProfile::analysis()
        };
        assert_eq!(profile.backoff_delay(5).as_millis(), 1200);
    }

    #[test]
    fn configuration_errors_classify_as_permanent() {
        assert_eq!(
            classify_error(&LlmError::Configuration("bad model id".into())),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn timeout_and_transport_classify_as_transient() {
        assert_eq!(
            classify_error(&LlmError::Timeout { elapsed_ms: 60_000 }),
            ErrorClass::Transient
        );
        assert_eq!(
            classify_error(&LlmError::Transport("connection reset".into())),
            ErrorClass::Transient
        );
    }
}
