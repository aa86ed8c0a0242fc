//! Shared identifiers and clock abstraction used across the workflow engine
//! workspace.

pub mod cancellation;
pub mod clock;
pub mod id;

pub use cancellation::CancellationFlag;
pub use clock::{Clock, FixedClock, SystemClock};
pub use id::{ConnectionId, ExecutionId, LogEntryId, NodeExecutionId, NodeId, WorkflowId};
