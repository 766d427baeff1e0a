//! Time subsystem.
//!
//! [`TimeSource`] is what per-frame logic reads; [`DeltaTime`] is the shared
//! cell the frame driver writes into; [`FrameClock`] measures (or fixes) the
//! delta for each frame pulse.

mod frame_clock;
mod source;

pub use frame_clock::{FrameClock, FrameTime};
pub use source::{DeltaTime, TimeSource};
