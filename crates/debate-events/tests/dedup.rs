//! Property test: event ids are unique within a session and identical across
//! restarts, since they are deterministic from content.

use debate_events::{Event, EventId};
use debate_state::SessionId;
use proptest::prelude::*;

proptest! {
    #[test]
    fn event_ids_are_unique_per_sequence_index(
        node in "[a-z_]{1,12}",
        count in 1usize..64,
    ) {
        let session_id = SessionId::new();
        let mut ids = std::collections::HashSet::new();
        for i in 0..count as u64 {
            ids.insert(EventId::compute(session_id, &node, i));
        }
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn event_ids_are_identical_across_recomputation(
        node in "[a-z_]{1,12}",
        seq in 0u64..10_000,
    ) {
        let session_id = SessionId::new();
        let a = EventId::compute(session_id, &node, seq);
        let b = EventId::compute(session_id, &node, seq);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn event_round_trips_through_serialize_deserialize() {
    use chrono::Utc;
    use debate_events::EventType;

    let session_id = SessionId::new();
    let event = Event::new(
        session_id,
        EventType::ResultReady {
            root_cause: "disk full".into(),
            confidence: 0.9,
        },
        None,
        None,
        Utc::now(),
        0,
    );
    let json = serde_json::to_string(&event).unwrap();
    let once: Event = serde_json::from_str(&json).unwrap();
    let twice_json = serde_json::to_string(&once).unwrap();
    assert_eq!(json, twice_json);
}
