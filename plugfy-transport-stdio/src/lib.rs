//! STDInOut transport
//!
//! Inbound payloads are newline-delimited on the host's stdin; each line is
//! parsed as JSON and forwarded as a string when it is not valid JSON. A blank
//! line, or the end of the stream, ends the interactive session. Outbound
//! payloads are written to stdout as one JSON document per line.
//!
//! Built as a `cdylib`, this crate is a plugin module the host discovers in
//! its communications directory. A plugin links its own copy of tokio, which
//! never sees the host's runtime, so the transport only uses blocking std I/O
//! on a thread of its own.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_trait::async_trait;
use plugfy_channel::{
    ChannelError, ChannelLifecycle, ChannelResult, ChannelState, CommunicationChannel,
    InboundData, InboundSender,
};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Transport name used for selection
pub const CHANNEL_NAME: &str = "STDInOut";

type BoxedReader = Box<dyn BufRead + Send>;
type BoxedWriter = Box<dyn Write + Send>;

/// Sender shared with the listener thread; emptied by `close`
type InboundSlot = Arc<Mutex<Option<InboundSender>>>;

/// Channel over the host process's standard streams
#[derive(Default)]
pub struct StdioChannel {
    lifecycle: ChannelLifecycle,
    parameters: JsonValue,
    // Wrapped so the channel stays `Sync`; only accessed through `&mut self`
    input: Mutex<Option<BoxedReader>>,
    output: Mutex<Option<BoxedWriter>>,
    inbound: InboundSlot,
}

impl StdioChannel {
    /// Channel on the process's stdin and stdout
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel on arbitrary streams in place of stdin and stdout
    pub fn with_io<R, W>(input: R, output: W) -> Self
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            input: Mutex::new(Some(Box::new(input))),
            output: Mutex::new(Some(Box::new(output))),
            ..Self::default()
        }
    }

    /// Parameters the channel was initialized with
    pub fn parameters(&self) -> &JsonValue {
        &self.parameters
    }
}

#[async_trait]
impl CommunicationChannel for StdioChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn state(&self) -> ChannelState {
        self.lifecycle.state()
    }

    /// The operator types into the stream this channel reads
    fn owns_terminal(&self) -> bool {
        true
    }

    async fn initialize(&mut self, parameters: &JsonValue) -> ChannelResult<()> {
        self.lifecycle.transition(CHANNEL_NAME, ChannelState::Initialized)?;
        self.parameters = parameters.clone();
        Ok(())
    }

    async fn start_listening(&mut self, inbound: InboundSender) -> ChannelResult<()> {
        self.lifecycle.transition(CHANNEL_NAME, ChannelState::Listening)?;

        let input = self
            .input
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| Box::new(BufReader::new(io::stdin())) as BoxedReader);
        *self.inbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(inbound);

        let slot = Arc::clone(&self.inbound);
        // Detached: a read blocked on the terminal cannot be interrupted
        thread::Builder::new()
            .name("stdio-inbound".to_string())
            .spawn(move || read_inbound(input, slot))?;

        debug!(target: "channel", channel = CHANNEL_NAME, "Listening for inbound data");
        Ok(())
    }

    async fn send(&mut self, data: &JsonValue) -> ChannelResult<()> {
        if self.lifecycle.state() == ChannelState::Closed {
            return Err(ChannelError::ConnectionClosed);
        }

        let mut line = serde_json::to_vec(data)?;
        line.push(b'\n');

        let output = self
            .output
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| Box::new(io::stdout()) as BoxedWriter);
        output.write_all(&line)?;
        output.flush()?;
        Ok(())
    }

    async fn close(&mut self) -> ChannelResult<()> {
        // The listener stops at its next line once the sender is gone
        self.inbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(mut output) = self.output.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            if let Err(e) = output.flush() {
                warn!(target: "channel", channel = CHANNEL_NAME, "Failed to flush output: {}", e);
            }
        }
        self.lifecycle.transition(CHANNEL_NAME, ChannelState::Closed)
    }
}

fn read_inbound(mut input: BoxedReader, inbound: InboundSlot) {
    let mut line = String::new();

    loop {
        line.clear();
        let (payload, last) = match input.read_line(&mut line) {
            Ok(0) => {
                debug!(target: "channel", channel = CHANNEL_NAME, "Inbound stream ended");
                (InboundData::end_of_session(), true)
            }
            Ok(_) if line.trim().is_empty() => (InboundData::end_of_session(), true),
            Ok(_) => {
                let text = line.trim();
                let data = serde_json::from_str(text)
                    .unwrap_or_else(|_| JsonValue::String(text.to_string()));
                (InboundData::new(data).with_metadata("transport", CHANNEL_NAME), false)
            }
            Err(e) => {
                warn!(target: "channel", channel = CHANNEL_NAME, "Failed to read inbound data: {}", e);
                return;
            }
        };

        if !deliver(&inbound, payload) || last {
            return;
        }
    }
}

/// Hand `payload` to the host; false once the channel has been closed
fn deliver(inbound: &InboundSlot, payload: InboundData) -> bool {
    let slot = inbound.lock().unwrap_or_else(PoisonError::into_inner);
    match slot.as_ref() {
        Some(sender) => sender.send(payload).is_ok(),
        None => false,
    }
}

plugfy_channel::export_channels!(StdioChannel);
