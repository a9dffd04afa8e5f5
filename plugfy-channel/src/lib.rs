//! Communication channel capability for the plugfy library host
//!
//! This crate is the contract between the host and transport plugins: the
//! [`CommunicationChannel`] trait, its lifecycle, the inbound payload type and
//! the entry point a plugin module exports so the host can find its channels.

pub mod channel;
pub mod error;
pub mod guard;
pub mod message;
pub mod module;

// Re-export commonly used types
pub use channel::{ChannelLifecycle, ChannelState, CommunicationChannel};
pub use error::{ChannelError, ChannelResult};
pub use guard::GuardedChannel;
pub use message::{inbound_queue, InboundData, InboundReceiver, InboundSender};
pub use module::{ChannelFactory, ChannelModuleEntry, CHANNEL_MODULE_SYMBOL};
