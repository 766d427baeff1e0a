use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::{App, AppControl, FrameCtx};
use crate::services::{Provided, ServiceContainer, TeardownReport};
use crate::tick::{FrameReport, TickScheduler};
use crate::time::{DeltaTime, FrameClock, FrameTime, TimeSource};

/// Frame driver configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Fixed frame step. `None` measures wall-clock time between frames.
    pub fixed_step: Option<Duration>,
    /// Stop [`Runtime::run`] after this many frames.
    pub max_frames: Option<u64>,
}

impl RuntimeConfig {
    /// Fixed-step, bounded run; the usual setup for headless hosts and tests.
    pub fn headless(step: Duration, frames: u64) -> Self {
        Self { fixed_step: Some(step), max_frames: Some(frames) }
    }
}

/// Owns the service container, the tick scheduler and the frame delta.
///
/// On construction the runtime registers:
/// - `TickScheduler` (fixed, released at teardown by clearing it)
/// - `DeltaTime` and `dyn TimeSource` (the same shared cell)
///
/// A host calls [`advance`](Self::advance) (or [`step`](Self::step)) exactly once
/// per frame; this is the single "advance one frame" pulse.
pub struct Runtime {
    config: RuntimeConfig,
    services: ServiceContainer,
    scheduler: Rc<TickScheduler>,
    time: Rc<DeltaTime>,
    clock: FrameClock,
    shut_down: bool,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let scheduler = Rc::new(TickScheduler::new());
        let time = Rc::new(DeltaTime::new());
        let clock = match config.fixed_step {
            Some(step) => FrameClock::fixed(step),
            None => FrameClock::new(),
        };

        let mut services = ServiceContainer::new();
        services.register(Provided::shared(Rc::clone(&scheduler)).with_release_of_self());
        services.register(Provided::shared(Rc::clone(&time)));
        let source: Rc<dyn TimeSource> = time.clone();
        services.register(Provided::shared(source));

        Self {
            config,
            services,
            scheduler,
            time,
            clock,
            shut_down: false,
        }
    }

    #[inline]
    pub fn services(&mut self) -> &mut ServiceContainer {
        &mut self.services
    }

    #[inline]
    pub fn scheduler(&self) -> &Rc<TickScheduler> {
        &self.scheduler
    }

    #[inline]
    pub fn time(&self) -> &Rc<DeltaTime> {
        &self.time
    }

    /// Publishes `dt` as the current frame delta and runs one tick pass.
    pub fn advance(&mut self, dt: f32) -> FrameReport {
        self.time.set(dt);
        self.scheduler.update()
    }

    /// Advances by the next delta from the internal clock.
    pub fn step(&mut self) -> (FrameTime, FrameReport) {
        let ft = self.clock.tick();
        let report = self.advance(ft.dt);
        (ft, report)
    }

    /// Drives `app` until it exits or `max_frames` is reached, then shuts down.
    ///
    /// Returns the number of frames run.
    pub fn run<A: App>(&mut self, app: &mut A) -> Result<u64> {
        app.on_start(&mut self.services)
            .context("app failed to start")?;
        log::info!("runtime started ({} services)", self.services.len());

        let mut frames = 0u64;
        loop {
            if self.config.max_frames.is_some_and(|max| frames >= max) {
                break;
            }

            let (time, report) = self.step();
            frames += 1;

            let mut ctx = FrameCtx {
                time,
                report: &report,
                services: &mut self.services,
                scheduler: &self.scheduler,
            };
            if app.on_frame(&mut ctx) == AppControl::Exit {
                break;
            }
        }

        app.on_shutdown(&mut self.services);
        let teardown = self.shutdown();
        log::info!(
            "runtime stopped after {frames} frames ({} released, {} teardown faults)",
            teardown.released,
            teardown.faults.len()
        );
        Ok(frames)
    }

    /// Disposes the container (release hooks run in production order), then
    /// drops any remaining tick registrations. Later calls are no-ops.
    pub fn shutdown(&mut self) -> TeardownReport {
        if self.shut_down {
            return TeardownReport::default();
        }
        self.shut_down = true;

        let report = self.services.dispose();
        self.scheduler.clear();
        report
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
