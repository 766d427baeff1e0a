use std::collections::VecDeque;

use rand::Rng;
use rand::rngs::StdRng;

use crate::channel::Channel;
use crate::clip::ClipHandle;

/// Index of a voice in the SFX pool. Stable for the lifetime of the mixer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VoiceId(pub(crate) usize);

impl VoiceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed-capacity pool of one-shot voices.
///
/// Every voice is in exactly one of `free` or `active`. `active` is kept in
/// start order; when no voice is free the first active voice is reused,
/// whether or not it is still sounding.
pub(crate) struct VoicePool {
    voices: Vec<Channel>,
    free: VecDeque<VoiceId>,
    active: Vec<VoiceId>,
}

impl VoicePool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            voices: (0..capacity).map(|_| Channel::new(false)).collect(),
            free: (0..capacity).map(VoiceId).collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.voices.len()
    }

    #[inline]
    pub(crate) fn free_len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub(crate) fn active(&self) -> &[VoiceId] {
        &self.active
    }

    pub(crate) fn voice(&self, id: VoiceId) -> Option<&Channel> {
        self.voices.get(id.0)
    }

    pub(crate) fn voices(&self) -> &[Channel] {
        &self.voices
    }

    /// Starts `clip` on a free voice, or steals the oldest-started active one.
    ///
    /// Returns `None` only for a zero-capacity pool.
    pub(crate) fn play(
        &mut self,
        clip: ClipHandle,
        volume: f32,
        pitch_variance: f32,
        rng: &mut StdRng,
    ) -> Option<VoiceId> {
        let id = match self.free.pop_front() {
            Some(id) => id,
            None if !self.active.is_empty() => {
                let id = self.active.remove(0);
                log::trace!("sfx voice {} stolen", id.0);
                id
            }
            None => return None,
        };

        let voice = &mut self.voices[id.0];
        voice.assign(clip);
        voice.set_volume(clamp_unit(volume));
        voice.set_pitch(1.0 + random_offset(pitch_variance, rng));
        voice.play();
        self.active.push(id);

        self.debug_check_partition();
        Some(id)
    }

    /// Moves naturally finished voices back to the free set.
    ///
    /// Returns the number of reclaimed voices.
    pub(crate) fn reclaim_finished(&mut self) -> usize {
        let mut reclaimed = 0;
        for i in (0..self.active.len()).rev() {
            let id = self.active[i];
            if !self.voices[id.0].is_playing() {
                self.active.remove(i);
                self.free.push_back(id);
                reclaimed += 1;
            }
        }
        self.debug_check_partition();
        reclaimed
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        for &id in &self.active {
            self.voices[id.0].advance(dt);
        }
    }

    /// Stops every voice and returns all of them to the free set.
    pub(crate) fn stop_all(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.stop();
        }
        self.free.extend(self.active.drain(..));
        self.debug_check_partition();
    }

    #[inline]
    fn debug_check_partition(&self) {
        debug_assert_eq!(
            self.free.len() + self.active.len(),
            self.voices.len(),
            "voice pool partition violated"
        );
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Uniform sample in `[-variance, variance]`; 0 for non-positive or non-finite input.
fn random_offset(variance: f32, rng: &mut StdRng) -> f32 {
    if variance.is_finite() && variance > 0.0 {
        rng.gen_range(-variance..=variance)
    } else {
        0.0
    }
}
