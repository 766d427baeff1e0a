use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hearth_audio::{AudioMixer, ClipLibrary, FootstepBank};
use hearth_engine::services::Release;
use hearth_engine::tick::{TickId, TickPriority, TickScheduler};
use hearth_engine::time::TimeSource;

const STEP_DISTANCE: f32 = 1.0;
const DEFAULT_SURFACE: &str = "grass";
const DEFAULT_BGM: &str = "river";

/// Scripted stand-in for player movement: walks, pauses, walks.
#[derive(Default)]
pub struct Walker {
    pub distance_since_last_step: Cell<f32>,
    pub total_distance: Cell<f32>,
    elapsed: Cell<f32>,
    registration: RefCell<Option<(Weak<TickScheduler>, TickId)>>,
}

impl Walker {
    const SPEED: f32 = 4.0;

    /// Starts walking on `ticks`. A second call replaces the first registration.
    pub fn register(self: &Rc<Self>, time: Rc<dyn TimeSource>, ticks: &Rc<TickScheduler>) {
        let _ = self.release();
        let this = Rc::downgrade(self);
        let id = ticks.add_tick(TickPriority::Normal, move || {
            let Some(walker) = this.upgrade() else { return Ok(()) };
            let dt = time.delta_time();
            let t = walker.elapsed.get() + dt;
            walker.elapsed.set(t);

            // Idle between 2 s and 3 s.
            if (2.0..3.0).contains(&t) {
                return Ok(());
            }
            let moved = Self::SPEED * dt;
            walker.distance_since_last_step.set(walker.distance_since_last_step.get() + moved);
            walker.total_distance.set(walker.total_distance.get() + moved);
            Ok(())
        });
        *self.registration.borrow_mut() = Some((Rc::downgrade(ticks), id));
    }
}

impl Release for Walker {
    fn release(&self) -> anyhow::Result<()> {
        if let Some((ticks, id)) = self.registration.borrow_mut().take() {
            if let Some(ticks) = ticks.upgrade() {
                ticks.remove_tick(id);
            }
        }
        Ok(())
    }
}

/// Plays a footstep every `STEP_DISTANCE` units walked.
pub struct FootstepEmitter {
    ticks: Rc<TickScheduler>,
    tick: TickId,
    pub steps: Rc<Cell<u32>>,
}

impl FootstepEmitter {
    pub fn new(
        walker: Rc<Walker>,
        bank: Rc<FootstepBank>,
        mixer: Rc<AudioMixer>,
        ticks: Rc<TickScheduler>,
        seed: u64,
    ) -> Self {
        let steps = Rc::new(Cell::new(0));
        let counter = Rc::clone(&steps);
        let mut rng = StdRng::seed_from_u64(seed);

        let tick = ticks.add_tick(TickPriority::Normal, move || {
            let travelled = walker.distance_since_last_step.get();
            if travelled < STEP_DISTANCE {
                return Ok(());
            }
            walker.distance_since_last_step.set(travelled - STEP_DISTANCE);

            if let Some(clip) = bank.random_clip(DEFAULT_SURFACE) {
                // ±15% volume, 5-15% pitch spread.
                let volume = rng.gen_range(0.85..1.15);
                let pitch_variance = rng.gen_range(0.05..0.15);
                mixer.play_sfx(Some(clip), volume, pitch_variance);
                counter.set(counter.get() + 1);
            }
            Ok(())
        });

        Self { ticks, tick, steps }
    }
}

impl Release for FootstepEmitter {
    fn release(&self) -> anyhow::Result<()> {
        self.ticks.remove_tick(self.tick);
        Ok(())
    }
}

/// Starts the default background track as soon as it is loaded.
pub struct BgmStarter;

impl BgmStarter {
    pub fn new(library: &ClipLibrary, mixer: Rc<AudioMixer>) -> Self {
        library.load(DEFAULT_BGM, move |clip| {
            log::info!("bgm '{}' ready", clip.name());
            mixer.play_music(Some(clip.clone()), 1.0);
        });
        Self
    }
}
