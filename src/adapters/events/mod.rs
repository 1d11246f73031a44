//! Event bus adapters.
//!
//! - `InProcessEventBus` - synchronous dispatch to in-process handlers,
//!   optionally recording events for assertions

mod in_process;

pub use in_process::InProcessEventBus;
