use std::rc::Rc;

use crate::services::ServiceContainer;
use crate::tick::{FrameReport, TickScheduler};
use crate::time::FrameTime;

/// Per-frame context passed to `core::App::on_frame`.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    pub time: FrameTime,
    /// Result of the tick pass that just ran.
    pub report: &'a FrameReport,
    pub services: &'a mut ServiceContainer,
    pub scheduler: &'a Rc<TickScheduler>,
}

impl FrameCtx<'_> {
    /// Returns `true` if any callback faulted during this frame.
    #[inline]
    pub fn had_faults(&self) -> bool {
        !self.report.faults.is_empty()
    }
}
