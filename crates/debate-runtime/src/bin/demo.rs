//! Runnable end-to-end demo: wires a `SessionService` to the in-memory store, the
//! stub LLM client, and a `NullTool` per capability, then drives one incident through
//! to a final result. Mirrors the shape of the `orchestrator-server` binary's
//! startup sequence (tracing init, then construct and run) without any of its
//! HTTP/LDAP/TLS plumbing, which this workspace has no use for.

use debate_runtime::{InMemorySessionStore, NullTool, StubLlmClient};
use debate_session::{SessionConfig, SessionService};
use debate_state::{Incident, IncidentId, IncidentSeverity, SystemClock};
use debate_tools::ToolKind;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::default());
    let clock = Arc::new(SystemClock);
    let llm_client = Arc::new(StubLlmClient);

    let mut service = SessionService::new(store, dispatcher, clock, llm_client, "demo-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }

    let incident = Incident {
        id: IncidentId::new(),
        title: "checkout 5xx spike".to_string(),
        description: "checkout service began returning 5xx for all write traffic".to_string(),
        severity: IncidentSeverity::High,
        service_name: "checkout".to_string(),
        environment: "prod".to_string(),
        log_content: "PANIC: could not write to file: No space left on device".to_string(),
    };

    let session_id = service.create_session(incident).await?;
    tracing::info!(%session_id, "session created");

    let mut events = service.subscribe(session_id, None);
    service.start_session(session_id, SessionConfig::default()).await?;

    let watch = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!(?event.event_type, node = %event.event_type.node_name(), "event");
        }
    });

    match service.fetch_final_result(session_id, Duration::from_secs(30)).await {
        Ok(result) => {
            println!("root cause: {}", result.root_cause);
            println!("confidence: {:.2}", result.confidence);
            println!("risk level: {:?}", result.risk_level);
            println!("fix recommendation: {}", result.fix_recommendation);
        }
        Err(error) => {
            eprintln!("session did not reach a final result: {error}");
        }
    }

    watch.abort();
    Ok(())
}
