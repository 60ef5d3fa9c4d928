//! Session Service: lifecycle (`create_session`/`start_session`), cancellation and
//! recovery (`send_control`), event subscription, and configuration loading. The
//! outermost crate in the workspace — it owns every other crate's collaborators and
//! drives one `debate-graph::GraphExecutor` per running session.

pub mod config;
pub mod control;
pub mod service;

pub use config::{ConfigError, SessionConfig};
pub use control::ControlAction;
pub use service::{SessionService, SessionServiceError};
