//! The pure routing function: `(state) -> next_node_name | END`, consulting
//! `route.current_phase`, pending-feedback completeness, and the
//! aggregate-handoff marker on `route.next_node`. Grounded in the conditional-edge
//! router closures of `graph.rs`'s `ConditionalEdgeResult`, collapsed
//! here into one exhaustive match since the phase state machine is fixed rather than
//! user-defined.

use debate_state::context_shortcuts::has_usable_asset_mapping;
use debate_state::{DebateState, Phase};

pub const END: &str = "__end__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Node(String),
    End,
}

/// Decide the next node name for `state`. Pure: depends only on `state`, never on
/// wall-clock time or I/O.
pub fn route(state: &DebateState) -> RouteTarget {
    let round = state.route.loop_round;

    match state.route.current_phase {
        Phase::Init => RouteTarget::Node("init_session".to_string()),
        Phase::AssetMapping => {
            if has_usable_asset_mapping(state) {
                RouteTarget::Node("supervisor_decide".to_string())
            } else {
                RouteTarget::Node("collect_assets".to_string())
            }
        }
        Phase::Analysis | Phase::Critique | Phase::Rebuttal => {
            if !state.round_complete(round) {
                RouteTarget::Node("phase_fanout".to_string())
            } else if state.route.next_node.as_deref() == Some("supervisor_decide") {
                RouteTarget::Node("supervisor_decide".to_string())
            } else {
                RouteTarget::Node("aggregate".to_string())
            }
        }
        Phase::Judgment => RouteTarget::Node("judge".to_string()),
        Phase::Verification => RouteTarget::Node("verify".to_string()),
        Phase::Report => RouteTarget::Node("report".to_string()),
        Phase::Terminal => RouteTarget::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_state::Route;
    use serde_json::json;

    #[test]
    fn init_routes_to_init_session() {
        let state = DebateState::new();
        assert_eq!(route(&state), RouteTarget::Node("init_session".to_string()));
    }

    #[test]
    fn terminal_routes_to_end() {
        let mut state = DebateState::new();
        state.route.current_phase = Phase::Terminal;
        assert_eq!(route(&state), RouteTarget::End);
    }

    #[test]
    fn asset_mapping_without_mapping_routes_to_collect_assets() {
        let mut state = DebateState::new();
        state.route.current_phase = Phase::AssetMapping;
        assert_eq!(route(&state), RouteTarget::Node("collect_assets".to_string()));
    }

    #[test]
    fn asset_mapping_with_mapping_routes_to_supervisor_decide() {
        let mut state = DebateState::new();
        state.route.current_phase = Phase::AssetMapping;
        state
            .context
            .insert("asset_mapping".to_string(), json!({"checkout": {"environment": "prod"}}));
        assert_eq!(route(&state), RouteTarget::Node("supervisor_decide".to_string()));
    }

    #[test]
    fn analysis_with_pending_work_routes_to_phase_fanout() {
        use debate_state::{Command, ToolUsage};
        use std::collections::HashSet;

        let mut state = DebateState::new();
        state.route.current_phase = Phase::Analysis;
        state.commands.insert(
            "LogAgent".to_string(),
            Command {
                issued_round: 0,
                task: "investigate".into(),
                focus: "logs".into(),
                expected_output_schema_id: "log_v1".into(),
                use_tool: ToolUsage::Optional,
                tool_targets: HashSet::new(),
                deadline_ms: 1000,
            },
        );
        assert_eq!(route(&state), RouteTarget::Node("phase_fanout".to_string()));
    }

    #[test]
    fn analysis_with_settled_round_routes_to_aggregate_before_the_marker_is_set() {
        let mut state = DebateState::new();
        state.route.current_phase = Phase::Critique;
        state.route.next_node = None;
        assert_eq!(route(&state), RouteTarget::Node("aggregate".to_string()));
    }

    #[test]
    fn analysis_with_settled_round_routes_to_supervisor_decide_after_the_marker_is_set() {
        let mut state = DebateState::new();
        state.route = Route {
            current_phase: Phase::Critique,
            next_node: Some("supervisor_decide".to_string()),
            loop_round: 0,
        };
        assert_eq!(route(&state), RouteTarget::Node("supervisor_decide".to_string()));
    }
}
