use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous frame.
    pub dt: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

#[derive(Debug, Clone)]
enum Mode {
    /// Measures wall-clock time between ticks.
    Wall { last: Instant },
    /// Every tick advances by the same amount (headless runs, tests).
    Fixed { step: Duration },
}

/// Produces one `FrameTime` per frame pulse.
///
/// Wall-clock deltas are clamped so a debugger pause or a stalled host does not
/// hand a multi-second step to fades and movement.
#[derive(Debug, Clone)]
pub struct FrameClock {
    mode: Mode,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Wall-clock mode with default clamps (0.1 ms .. 250 ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Wall-clock mode with custom clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            mode: Mode::Wall { last: Instant::now() },
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Fixed-step mode: every tick reports exactly `step`. Clamps do not apply.
    pub fn fixed(step: Duration) -> Self {
        Self {
            mode: Mode::Fixed { step },
            frame_index: 0,
            dt_min: Duration::ZERO,
            dt_max: Duration::MAX,
        }
    }

    /// Resets the wall-clock baseline, e.g. after the host resumes from suspension.
    pub fn reset(&mut self) {
        if let Mode::Wall { last } = &mut self.mode {
            *last = Instant::now();
        }
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Advances the clock and returns the new frame's timing.
    pub fn tick(&mut self) -> FrameTime {
        let dt = match &mut self.mode {
            Mode::Fixed { step } => *step,
            Mode::Wall { last } => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(*last).clamp(self.dt_min, self.dt_max);
                *last = now;
                dt
            }
        };

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
