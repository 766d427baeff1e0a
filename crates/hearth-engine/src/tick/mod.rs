//! Per-frame tick scheduling.
//!
//! Game logic registers callbacks with a [`TickScheduler`] instead of hooking
//! the host's update loop directly. The host calls [`TickScheduler::update`]
//! exactly once per frame.

mod priority;
mod scheduler;

pub use priority::{TickId, TickPriority};
pub use scheduler::{CallbackFault, FrameReport, TickScheduler};
