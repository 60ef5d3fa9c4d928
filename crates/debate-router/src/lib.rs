pub mod decision;
pub mod llm_supervisor;
pub mod rule_supervisor;
pub mod supervisor_router;

pub use decision::{RuleOutcome, SupervisorDecision, SupervisorMode};
pub use llm_supervisor::LlmSupervisor;
pub use rule_supervisor::{RuleSupervisor, RuleSupervisorConfig, CONFIDENCE_LOW};
pub use supervisor_router::SupervisorRouter;
