//! Transport module whose channels panic
//!
//! `Faulty` constructs fine and panics as soon as it is initialized.
//! `Unbuildable` panics in its constructor, which takes every channel type
//! declared after it down with it.

use async_trait::async_trait;
use plugfy_channel::{ChannelResult, ChannelState, CommunicationChannel, InboundSender};
use serde_json::Value as JsonValue;

#[derive(Default)]
pub struct FaultyChannel;

#[async_trait]
impl CommunicationChannel for FaultyChannel {
    fn name(&self) -> &str {
        "Faulty"
    }

    fn state(&self) -> ChannelState {
        ChannelState::Created
    }

    async fn initialize(&mut self, _parameters: &JsonValue) -> ChannelResult<()> {
        panic!("faulty transport refused to initialize");
    }

    async fn start_listening(&mut self, _inbound: InboundSender) -> ChannelResult<()> {
        Ok(())
    }

    async fn send(&mut self, _data: &JsonValue) -> ChannelResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}

pub struct UnbuildableChannel;

impl Default for UnbuildableChannel {
    fn default() -> Self {
        panic!("unbuildable transport");
    }
}

#[async_trait]
impl CommunicationChannel for UnbuildableChannel {
    fn name(&self) -> &str {
        "Unbuildable"
    }

    fn state(&self) -> ChannelState {
        ChannelState::Created
    }

    async fn initialize(&mut self, _parameters: &JsonValue) -> ChannelResult<()> {
        Ok(())
    }

    async fn start_listening(&mut self, _inbound: InboundSender) -> ChannelResult<()> {
        Ok(())
    }

    async fn send(&mut self, _data: &JsonValue) -> ChannelResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> ChannelResult<()> {
        Ok(())
    }
}

plugfy_channel::export_channels!(FaultyChannel, UnbuildableChannel);
