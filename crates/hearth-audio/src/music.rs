use std::cell::RefCell;
use std::rc::{Rc, Weak};

use hearth_engine::tick::{TickId, TickPriority, TickScheduler};
use hearth_engine::time::TimeSource;

use crate::channel::Channel;
use crate::clip::ClipHandle;

/// One of the two symmetric music slots.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    #[inline]
    pub fn other(self) -> SlotId {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Observable state of the music bus.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MusicState {
    /// The active slot is silent and no fade is running.
    Idle,
    /// The active slot is playing and no fade is running.
    Playing,
    /// A fade job is in progress.
    Fading,
}

/// An in-progress linear volume fade.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FadeJob {
    pub from: SlotId,
    /// `None` for a fade-out without replacement.
    pub to: Option<SlotId>,
    pub duration: f32,
    pub progress: f32,
    pub swap_on_complete: bool,
}

pub(crate) struct MusicBus {
    slots: [Channel; 2],
    active: SlotId,
    fade: Option<FadeJob>,
    fade_tick: Option<TickId>,
    /// Bumped for every new fade job; a fade tick only drives its own job.
    generation: u64,
}

impl MusicBus {
    fn new() -> Self {
        Self {
            slots: [Channel::new(true), Channel::new(true)],
            active: SlotId::A,
            fade: None,
            fade_tick: None,
            generation: 0,
        }
    }

    #[inline]
    fn slot_mut(&mut self, id: SlotId) -> &mut Channel {
        &mut self.slots[id.index()]
    }

    /// Advances the fade job started as `generation` by `dt`. Returns the fade
    /// tick once the job is complete so the caller can unregister it.
    ///
    /// A tick cancelled earlier in the current pass still runs once; it finds a
    /// newer generation (or no job) and does nothing.
    fn advance_fade(&mut self, generation: u64, dt: f32) -> Option<TickId> {
        if self.generation != generation {
            return None;
        }
        let job = {
            let job = self.fade.as_mut()?;
            job.progress += dt;
            *job
        };

        let t = (job.progress / job.duration).clamp(0.0, 1.0);
        self.slot_mut(job.from).set_volume(lerp(1.0, 0.0, t));
        if let Some(to) = job.to {
            self.slot_mut(to).set_volume(lerp(0.0, 1.0, t));
        }

        if t < 1.0 {
            return None;
        }

        self.slot_mut(job.from).stop();
        if let (true, Some(to)) = (job.swap_on_complete, job.to) {
            self.active = to;
        }
        self.fade = None;
        log::debug!("music fade complete; active slot {:?}", self.active);
        self.fade_tick.take()
    }

    pub(crate) fn advance_playback(&mut self, dt: f32) {
        for slot in self.slots.iter_mut() {
            slot.advance(dt);
        }
    }
}

/// Two-slot music crossfader.
///
/// Fade progress is driven by a Normal-priority tick that exists only while a
/// fade job does.
pub(crate) struct MusicChannel {
    bus: Rc<RefCell<MusicBus>>,
    ticks: Rc<TickScheduler>,
    time: Rc<dyn TimeSource>,
    min_fade: f32,
}

impl MusicChannel {
    pub(crate) fn new(ticks: Rc<TickScheduler>, time: Rc<dyn TimeSource>, min_fade: f32) -> Self {
        Self {
            bus: Rc::new(RefCell::new(MusicBus::new())),
            ticks,
            time,
            min_fade,
        }
    }

    pub(crate) fn bus(&self) -> Weak<RefCell<MusicBus>> {
        Rc::downgrade(&self.bus)
    }

    pub(crate) fn play(&self, clip: Option<ClipHandle>, fade: f32) {
        let Some(clip) = clip else { return };
        let mut bus = self.bus.borrow_mut();
        let active = bus.active;

        // `!(fade > 0.0)` also routes NaN to the immediate path.
        if !bus.slots[active.index()].is_playing() || !(fade > 0.0) {
            self.cancel_fade(&mut bus);
            let slot = bus.slot_mut(active);
            slot.assign(clip);
            slot.set_volume(1.0);
            slot.play();
            return;
        }

        let inactive = active.other();
        let slot = bus.slot_mut(inactive);
        slot.assign(clip);
        slot.set_volume(0.0);
        slot.play();

        self.start_fade(&mut bus, active, Some(inactive), fade, true);
    }

    pub(crate) fn stop(&self, fade: f32) {
        let mut bus = self.bus.borrow_mut();
        let active = bus.active;
        if !bus.slots[active.index()].is_playing() {
            return;
        }

        if !(fade > 0.0) {
            self.cancel_fade(&mut bus);
            bus.slot_mut(active).stop();
            return;
        }

        self.start_fade(&mut bus, active, None, fade, false);
    }

    pub(crate) fn state(&self) -> MusicState {
        let bus = self.bus.borrow();
        if bus.fade.is_some() {
            MusicState::Fading
        } else if bus.slots[bus.active.index()].is_playing() {
            MusicState::Playing
        } else {
            MusicState::Idle
        }
    }

    pub(crate) fn active_slot(&self) -> SlotId {
        self.bus.borrow().active
    }

    pub(crate) fn slot(&self, id: SlotId) -> Channel {
        self.bus.borrow().slots[id.index()].clone()
    }

    pub(crate) fn fade_job(&self) -> Option<FadeJob> {
        self.bus.borrow().fade
    }

    /// Cancels any fade and silences both slots.
    pub(crate) fn release(&self) {
        let mut bus = self.bus.borrow_mut();
        self.cancel_fade(&mut bus);
        for slot in bus.slots.iter_mut() {
            slot.stop();
        }
    }

    fn start_fade(
        &self,
        bus: &mut MusicBus,
        from: SlotId,
        to: Option<SlotId>,
        duration: f32,
        swap_on_complete: bool,
    ) {
        self.cancel_fade(bus);

        bus.fade = Some(FadeJob {
            from,
            to,
            duration: duration.max(self.min_fade),
            progress: 0.0,
            swap_on_complete,
        });
        bus.generation += 1;
        let generation = bus.generation;

        let weak_bus = Rc::downgrade(&self.bus);
        let weak_ticks = Rc::downgrade(&self.ticks);
        let time = Rc::clone(&self.time);
        bus.fade_tick = Some(self.ticks.add_tick(TickPriority::Normal, move || {
            let Some(bus) = weak_bus.upgrade() else { return Ok(()) };
            let finished = bus.borrow_mut().advance_fade(generation, time.delta_time());
            if let (Some(id), Some(ticks)) = (finished, weak_ticks.upgrade()) {
                ticks.remove_tick(id);
            }
            Ok(())
        }));
    }

    /// Drops the fade job in place. Slot volumes keep their last computed values
    /// and no swap happens.
    fn cancel_fade(&self, bus: &mut MusicBus) {
        if bus.fade.take().is_some() {
            if let Some(id) = bus.fade_tick.take() {
                self.ticks.remove_tick(id);
            }
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
