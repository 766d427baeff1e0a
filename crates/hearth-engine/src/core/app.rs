use crate::services::ServiceContainer;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Composition-root contract driven by [`crate::runtime::Runtime::run`].
///
/// Game logic does not live here; it registers ticks with the scheduler. An
/// `App` wires services at start, observes each finished frame (e.g. to mirror
/// mixer state into a host audio device) and decides when to stop.
pub trait App {
    /// Called once before the first frame. Register and eagerly resolve services here.
    fn on_start(&mut self, services: &mut ServiceContainer) -> anyhow::Result<()> {
        let _ = services;
        Ok(())
    }

    /// Called after every tick pass.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called once after the last frame, before the container is disposed.
    fn on_shutdown(&mut self, services: &mut ServiceContainer) {
        let _ = services;
    }
}
