//! Inbound payloads delivered by a listening channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Sending half handed to a channel when it starts listening
pub type InboundSender = mpsc::UnboundedSender<InboundData>;

/// Receiving half drained by the host's dispatch loop
pub type InboundReceiver = mpsc::UnboundedReceiver<InboundData>;

/// Create the queue connecting a channel's listener to the host
pub fn inbound_queue() -> (InboundSender, InboundReceiver) {
    mpsc::unbounded_channel()
}

/// Metadata key carrying a control instruction instead of worker data
pub const CONTROL_METADATA_KEY: &str = "control";

const END_OF_SESSION: &str = "end_of_session";

/// One payload received from the worker side of a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundData {
    /// Opaque payload, forwarded verbatim
    pub data: JsonValue,

    /// Transport-specific metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// When the transport received the payload
    pub received_at: DateTime<Utc>,
}

impl InboundData {
    /// Wrap a payload received now
    pub fn new(data: JsonValue) -> Self {
        Self {
            data,
            metadata: HashMap::new(),
            received_at: Utc::now(),
        }
    }

    /// Control payload asking the host to end the interactive session
    pub fn end_of_session() -> Self {
        Self::new(JsonValue::Null).with_metadata(CONTROL_METADATA_KEY, END_OF_SESSION)
    }

    pub fn is_end_of_session(&self) -> bool {
        self.metadata
            .get(CONTROL_METADATA_KEY)
            .is_some_and(|control| control == END_OF_SESSION)
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
