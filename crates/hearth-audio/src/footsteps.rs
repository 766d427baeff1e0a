use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::clip::ClipHandle;

/// Clip variations for one walkable surface.
#[derive(Debug, Clone)]
pub struct SurfaceClips {
    pub surface: String,
    pub clips: Vec<ClipHandle>,
}

/// Footstep clip variations grouped by surface.
pub struct FootstepBank {
    surfaces: Vec<SurfaceClips>,
    rng: RefCell<StdRng>,
}

impl FootstepBank {
    pub fn new(surfaces: Vec<SurfaceClips>, rng: StdRng) -> Self {
        Self { surfaces, rng: RefCell::new(rng) }
    }

    /// A uniformly chosen clip for `surface`; `None` if the surface is unknown
    /// or has no clips.
    pub fn random_clip(&self, surface: &str) -> Option<ClipHandle> {
        self.surfaces
            .iter()
            .filter(|s| s.surface == surface)
            .find(|s| !s.clips.is_empty())
            .and_then(|s| s.clips.choose(&mut *self.rng.borrow_mut()).cloned())
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &str> {
        self.surfaces.iter().map(|s| s.surface.as_str())
    }
}
