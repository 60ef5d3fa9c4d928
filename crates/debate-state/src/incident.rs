//! The immutable input to a debate session.

use crate::ids::IncidentId;
use serde::{Deserialize, Serialize};

/// Severity of the incident under investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// An incident is immutable once a session has been created from it — the debate
/// operates on a pointer to this value, never a mutable copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub service_name: String,
    pub environment: String,
    pub log_content: String,
}

impl Incident {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        service_name: impl Into<String>,
        environment: impl Into<String>,
        log_content: impl Into<String>,
    ) -> Self {
        Self {
            id: IncidentId::new(),
            title: title.into(),
            description: description.into(),
            severity,
            service_name: service_name.into(),
            environment: environment.into(),
            log_content: log_content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_gets_a_fresh_id() {
        let a = Incident::new("a", "desc", Severity::High, "svc", "prod", "log");
        let b = Incident::new("a", "desc", Severity::High, "svc", "prod", "log");
        assert_ne!(a.id, b.id);
    }
}
