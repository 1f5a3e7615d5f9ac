//! Pipeline state coordination.
//!
//! - [`state`]: the synchronous state machine
//! - [`manager`]: the async [`Coordinator`] that dispatches stage requests

pub mod manager;
pub mod state;

pub use manager::{Coordinator, StageTask};
pub use state::{BeginRejection, PipelineState};
