use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use hearth_engine::services::Release;
use hearth_engine::tick::{TickId, TickPriority, TickScheduler};
use hearth_engine::time::TimeSource;

use crate::channel::Channel;
use crate::clip::ClipHandle;
use crate::music::{FadeJob, MusicChannel, MusicState, SlotId};
use crate::sfx::{VoiceId, VoicePool};

/// Mixer configuration.
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Number of SFX voices. Fixed for the mixer's lifetime.
    pub sfx_pool_size: usize,
    /// Lower bound applied to fade durations, in seconds.
    pub min_fade: f32,
    /// Seed for pitch variance. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sfx_pool_size: 10,
            min_fade: 0.01,
            seed: None,
        }
    }
}

/// Copy of every channel's state, for mirroring into a host audio device.
#[derive(Debug, Clone)]
pub struct MixerSnapshot {
    pub active_slot: SlotId,
    /// Indexed by `SlotId as usize`.
    pub music: [Channel; 2],
    /// Indexed by [`VoiceId::index`].
    pub voices: Vec<Channel>,
}

/// Two-bus audio mixer: a crossfading music bus and a pooled, stealing SFX bus.
///
/// Construction registers one Normal-priority tick that advances playback and
/// returns finished SFX voices to the pool. A second Normal tick exists only
/// while a music fade is running. Releasing the mixer removes both.
///
/// A `None` clip is ignored at every entry point.
pub struct AudioMixer {
    music: MusicChannel,
    voices: Rc<RefCell<VoicePool>>,
    rng: RefCell<StdRng>,
    ticks: Rc<TickScheduler>,
    playback_tick: Cell<Option<TickId>>,
}

impl AudioMixer {
    pub fn new(config: MixerConfig, time: Rc<dyn TimeSource>, ticks: Rc<TickScheduler>) -> Self {
        let music = MusicChannel::new(Rc::clone(&ticks), Rc::clone(&time), config.min_fade);
        let voices = Rc::new(RefCell::new(VoicePool::new(config.sfx_pool_size)));
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let bus = music.bus();
        let pool = Rc::downgrade(&voices);
        let playback_tick = ticks.add_tick(TickPriority::Normal, move || {
            let dt = time.delta_time();
            if let Some(bus) = bus.upgrade() {
                bus.borrow_mut().advance_playback(dt);
            }
            if let Some(pool) = pool.upgrade() {
                let mut pool = pool.borrow_mut();
                pool.advance(dt);
                pool.reclaim_finished();
            }
            Ok(())
        });

        log::debug!("audio mixer created ({} sfx voices)", config.sfx_pool_size);

        Self {
            music,
            voices,
            rng: RefCell::new(rng),
            ticks,
            playback_tick: Cell::new(Some(playback_tick)),
        }
    }

    // ── music ─────────────────────────────────────────────────────────────

    /// Plays `clip` on the music bus.
    ///
    /// Starts immediately at full volume when nothing is playing or
    /// `fade <= 0`; otherwise crossfades from the active slot over `fade`
    /// seconds, cancelling any fade in progress.
    pub fn play_music(&self, clip: Option<ClipHandle>, fade: f32) {
        self.music.play(clip, fade);
    }

    /// Stops the music bus, immediately when `fade <= 0`, otherwise by fading
    /// the active slot out. Does nothing if the active slot is silent.
    pub fn stop_music(&self, fade: f32) {
        self.music.stop(fade);
    }

    pub fn music_state(&self) -> MusicState {
        self.music.state()
    }

    pub fn active_slot(&self) -> SlotId {
        self.music.active_slot()
    }

    pub fn music_slot(&self, id: SlotId) -> Channel {
        self.music.slot(id)
    }

    pub fn fade_job(&self) -> Option<FadeJob> {
        self.music.fade_job()
    }

    // ── sfx ───────────────────────────────────────────────────────────────

    /// Plays a one-shot `clip` at `volume` (clamped to `[0, 1]`) with a pitch of
    /// `1 ± pitch_variance`.
    ///
    /// Uses a free voice if there is one; otherwise the oldest-started active
    /// voice is cut off and reused. Returns the voice used.
    pub fn play_sfx(&self, clip: Option<ClipHandle>, volume: f32, pitch_variance: f32) -> Option<VoiceId> {
        let clip = clip?;
        let mut rng = self.rng.borrow_mut();
        let id = self.voices.borrow_mut().play(clip, volume, pitch_variance, &mut rng);
        if id.is_none() {
            log::warn!("play_sfx ignored: mixer has no sfx voices");
        }
        id
    }

    pub fn sfx_capacity(&self) -> usize {
        self.voices.borrow().capacity()
    }

    pub fn free_voices(&self) -> usize {
        self.voices.borrow().free_len()
    }

    /// Active voices in start order, oldest first.
    pub fn active_voices(&self) -> Vec<VoiceId> {
        self.voices.borrow().active().to_vec()
    }

    pub fn voice(&self, id: VoiceId) -> Option<Channel> {
        self.voices.borrow().voice(id).cloned()
    }

    // ── host sync ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> MixerSnapshot {
        MixerSnapshot {
            active_slot: self.music.active_slot(),
            music: [self.music.slot(SlotId::A), self.music.slot(SlotId::B)],
            voices: self.voices.borrow().voices().to_vec(),
        }
    }

    fn unregister_ticks(&self) {
        if let Some(id) = self.playback_tick.take() {
            self.ticks.remove_tick(id);
        }
        self.music.release();
    }
}

impl Release for AudioMixer {
    fn release(&self) -> anyhow::Result<()> {
        self.unregister_ticks();
        self.voices.borrow_mut().stop_all();
        log::debug!("audio mixer released");
        Ok(())
    }
}

impl Drop for AudioMixer {
    fn drop(&mut self) {
        self.unregister_ticks();
    }
}
