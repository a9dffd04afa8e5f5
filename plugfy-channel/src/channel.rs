//! The communication channel capability and its lifecycle

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::debug;

use crate::error::{ChannelError, ChannelResult};
use crate::message::InboundSender;

/// Lifecycle state of a communication channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// Constructed, nothing started
    #[default]
    Created,
    /// `initialize` completed
    Initialized,
    /// `start_listening` completed; inbound data may arrive at any time
    Listening,
    /// `close` completed; all resources released
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Created => "Created",
            ChannelState::Initialized => "Initialized",
            ChannelState::Listening => "Listening",
            ChannelState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// A named transport between the host and a worker process.
///
/// Implementations go through
/// `initialize -> start_listening -> [inbound data]* -> close`.
/// Once listening, a channel pushes every payload it receives into the
/// [`InboundSender`] it was given, from whatever task it chooses. `close`
/// must drop that sender so the host's dispatch loop can finish.
#[async_trait]
pub trait CommunicationChannel: Send + Sync {
    /// Logical transport name used for selection, e.g. `STDInOut`
    fn name(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> ChannelState;

    /// Whether the channel reads the operator's terminal.
    ///
    /// Such a channel ends an interactive session by delivering
    /// [`InboundData::end_of_session`](crate::InboundData::end_of_session),
    /// and the host does not read the terminal itself.
    fn owns_terminal(&self) -> bool {
        false
    }

    /// Prepare the channel for an execution with the given parameters
    async fn initialize(&mut self, parameters: &JsonValue) -> ChannelResult<()>;

    /// Start receiving; inbound payloads go to `inbound` until `close`
    async fn start_listening(&mut self, inbound: InboundSender) -> ChannelResult<()>;

    /// Send a payload to the worker side
    async fn send(&mut self, data: &JsonValue) -> ChannelResult<()>;

    /// Stop listening and release every resource held by the channel
    async fn close(&mut self) -> ChannelResult<()>;
}

/// Lifecycle guard that channel implementations embed to reject
/// out-of-order calls.
#[derive(Debug, Clone, Default)]
pub struct ChannelLifecycle {
    state: ChannelState,
}

impl ChannelLifecycle {
    /// Start in [`ChannelState::Created`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Whether a transition from the current state to `to` is legal
    pub fn can_transition(&self, to: ChannelState) -> bool {
        use ChannelState::*;
        matches!(
            (self.state, to),
            (Created, Initialized) | (Initialized, Listening) | (_, Closed)
        )
    }

    /// Move to `to`, or fail with [`ChannelError::InvalidTransition`].
    /// Closing an already closed channel is accepted.
    pub fn transition(&mut self, channel: &str, to: ChannelState) -> ChannelResult<()> {
        if !self.can_transition(to) {
            return Err(ChannelError::InvalidTransition {
                channel: channel.to_string(),
                from: self.state,
                to,
            });
        }

        debug!(
            target: "channel",
            channel = channel,
            from = %self.state,
            to = %to,
            "Channel state transition"
        );
        self.state = to;
        Ok(())
    }
}
