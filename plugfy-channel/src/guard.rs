//! Panic containment for channels exported from plugin modules
//!
//! A panic cannot unwind across a dynamic library boundary: the plugin has its
//! own copy of std, so the host's `catch_unwind` never sees it and the process
//! aborts. [`GuardedChannel`] is instantiated inside the plugin by
//! [`export_channels!`](crate::export_channels) and turns every panic raised
//! by the wrapped channel into a [`ChannelError::Panicked`] before it reaches
//! the boundary.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::channel::{ChannelState, CommunicationChannel};
use crate::error::{ChannelError, ChannelResult};
use crate::message::InboundSender;

/// A channel whose construction and methods never unwind
pub struct GuardedChannel<T> {
    inner: T,
    name: String,
}

impl<T> GuardedChannel<T>
where
    T: CommunicationChannel + Default + 'static,
{
    /// Construct `T`, reporting a panicking constructor as an error
    pub fn create() -> ChannelResult<Box<dyn CommunicationChannel>> {
        let (inner, name) = panic::catch_unwind(|| {
            let inner = T::default();
            let name = inner.name().to_string();
            (inner, name)
        })
        .map_err(|payload| ChannelError::Panicked(panic_message(payload.as_ref())))?;

        Ok(Box::new(Self { inner, name }))
    }
}

#[async_trait]
impl<T> CommunicationChannel for GuardedChannel<T>
where
    T: CommunicationChannel + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ChannelState {
        // A channel that panicked while reporting its state is unusable
        panic::catch_unwind(AssertUnwindSafe(|| self.inner.state())).unwrap_or(ChannelState::Closed)
    }

    fn owns_terminal(&self) -> bool {
        panic::catch_unwind(AssertUnwindSafe(|| self.inner.owns_terminal())).unwrap_or(false)
    }

    async fn initialize(&mut self, parameters: &JsonValue) -> ChannelResult<()> {
        let inner = &mut self.inner;
        CatchUnwind::new(move || inner.initialize(parameters)).await
    }

    async fn start_listening(&mut self, inbound: InboundSender) -> ChannelResult<()> {
        let inner = &mut self.inner;
        CatchUnwind::new(move || inner.start_listening(inbound)).await
    }

    async fn send(&mut self, data: &JsonValue) -> ChannelResult<()> {
        let inner = &mut self.inner;
        CatchUnwind::new(move || inner.send(data)).await
    }

    async fn close(&mut self) -> ChannelResult<()> {
        let inner = &mut self.inner;
        CatchUnwind::new(move || inner.close()).await
    }
}

type BoxedCall<'a> = Pin<Box<dyn Future<Output = ChannelResult<()>> + Send + 'a>>;

/// Future that reports a panic in either the call or any poll of its result
struct CatchUnwind<'a> {
    state: CallState<'a>,
}

enum CallState<'a> {
    Pending(Box<dyn FnOnce() -> BoxedCall<'a> + Send + 'a>),
    Running(BoxedCall<'a>),
    Done,
}

impl<'a> CatchUnwind<'a> {
    fn new<F>(call: F) -> Self
    where
        F: FnOnce() -> BoxedCall<'a> + Send + 'a,
    {
        Self {
            state: CallState::Pending(Box::new(call)),
        }
    }
}

impl Future for CatchUnwind<'_> {
    type Output = ChannelResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let result = panic::catch_unwind(AssertUnwindSafe(|| loop {
            match std::mem::replace(&mut this.state, CallState::Done) {
                CallState::Pending(call) => this.state = CallState::Running(call()),
                CallState::Running(mut future) => {
                    let poll = future.as_mut().poll(cx);
                    if poll.is_pending() {
                        this.state = CallState::Running(future);
                    }
                    return poll;
                }
                CallState::Done => return Poll::Ready(Err(ChannelError::ConnectionClosed)),
            }
        }));

        result.unwrap_or_else(|payload| {
            Poll::Ready(Err(ChannelError::Panicked(panic_message(payload.as_ref()))))
        })
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
