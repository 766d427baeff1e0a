//! Core engine-facing contracts.
//!
//! Defines the interface between the frame driver ([`crate::runtime`]) and the
//! composition root that wires services together.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
