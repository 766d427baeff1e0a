use std::cell::Cell;

/// Elapsed time since the previous frame, as seen by per-frame logic.
pub trait TimeSource {
    /// Seconds since the previous frame pulse.
    fn delta_time(&self) -> f32;
}

/// Host-driven delta time.
///
/// The frame driver writes the current frame's delta with [`set`](Self::set)
/// before running the tick pass; everything else only reads it.
#[derive(Debug, Default)]
pub struct DeltaTime {
    dt: Cell<f32>,
}

impl DeltaTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current frame delta. Negative and non-finite values are stored as 0.
    #[inline]
    pub fn set(&self, dt: f32) {
        self.dt.set(if dt.is_finite() { dt.max(0.0) } else { 0.0 });
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.dt.get()
    }
}

impl TimeSource for DeltaTime {
    #[inline]
    fn delta_time(&self) -> f32 {
        self.get()
    }
}
