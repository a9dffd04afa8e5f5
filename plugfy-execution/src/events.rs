//! Runtime events relayed to the caller during interactive executions

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

/// Event type tag for data relayed from an interactive session
pub const INTERACTIVE_EVENT: &str = "interactive";

/// Message attached to every relayed inbound payload
pub const DATA_RECEIVED_MESSAGE: &str = "Data received from runner";

/// One event handed to the caller's sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEvent {
    pub event_type: String,
    pub message: String,
    pub data: JsonValue,
}

impl RuntimeEvent {
    /// Wrap an inbound channel payload verbatim
    pub fn interactive(data: JsonValue) -> Self {
        Self {
            event_type: INTERACTIVE_EVENT.to_string(),
            message: DATA_RECEIVED_MESSAGE.to_string(),
            data,
        }
    }
}

/// Receiver of runtime events
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: RuntimeEvent);
}

impl EventSink for mpsc::UnboundedSender<RuntimeEvent> {
    fn on_event(&self, event: RuntimeEvent) {
        // The caller may have stopped listening; events are then discarded
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interactive_event_shape() {
        let event = RuntimeEvent::interactive(json!({"progress": 50}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "eventType": "interactive",
                "message": "Data received from runner",
                "data": {"progress": 50}
            })
        );
    }

    #[test]
    fn test_unbounded_sender_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_event(RuntimeEvent::interactive(json!("a")));
        tx.on_event(RuntimeEvent::interactive(json!("b")));
        assert_eq!(rx.try_recv().unwrap().data, json!("a"));
        assert_eq!(rx.try_recv().unwrap().data, json!("b"));

        drop(rx);
        tx.on_event(RuntimeEvent::interactive(json!("dropped")));
    }
}
