//! Phase Executor: bounded concurrent fan-out/fan-in over one round's commanded
//! specialists, with settle-all semantics.

pub mod executor;

pub use executor::{merge_deltas, PhaseExecutor, PhaseExecutorConfig, RoundCancelled, SettleOutcome};
