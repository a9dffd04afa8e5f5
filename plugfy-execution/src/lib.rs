//! Plugfy library extension execution engine
//!
//! Advertises the library operations, resolves the configured transport,
//! launches the worker process with the transport name and operation on its
//! command line, and relays what comes back over the channel to the caller.

pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod executor;
pub mod invocation;
pub mod process;
pub mod terminal;

// Re-export main types
pub use catalog::{OperationCatalog, OperationDescriptor, ParameterDescriptor, ValueType};
pub use coordinator::{ExecutionReport, LibraryExtension};
pub use error::{ExecutionError, ExecutionResult};
pub use events::{EventSink, RuntimeEvent};
pub use executor::{OutputStream, WorkerOutcome, WorkerRunner};
pub use invocation::WorkerInvocation;
pub use process::ProcessWorkerRunner;
pub use terminal::{ImmediateTermination, StdinTermination, TerminationSignal};
