use crate::clip::ClipHandle;

/// One virtual playback source.
///
/// The mixer only mutates channel state; a host mirrors it into its real audio
/// device (see [`crate::AudioMixer::snapshot`]). Playback position is simulated
/// from the frame delta so that one-shot voices finish on their own.
#[derive(Debug, Clone)]
pub struct Channel {
    clip: Option<ClipHandle>,
    volume: f32,
    pitch: f32,
    looping: bool,
    playing: bool,
    /// Seconds into the clip.
    cursor: f32,
}

impl Channel {
    pub fn new(looping: bool) -> Self {
        Self {
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping,
            playing: false,
            cursor: 0.0,
        }
    }

    #[inline]
    pub fn clip(&self) -> Option<&ClipHandle> {
        self.clip.as_ref()
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Replaces the clip. Does not start or stop playback.
    pub(crate) fn assign(&mut self, clip: ClipHandle) {
        self.clip = Some(clip);
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    pub(crate) fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    /// Starts the assigned clip from the beginning. Without a clip this stops.
    pub(crate) fn play(&mut self) {
        self.cursor = 0.0;
        self.playing = self.clip.is_some();
    }

    pub(crate) fn stop(&mut self) {
        self.playing = false;
    }

    /// Moves the play cursor by `dt` seconds scaled by pitch.
    pub(crate) fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let Some(length) = self.clip.as_ref().map(ClipHandle::length) else {
            self.playing = false;
            return;
        };

        self.cursor += dt * self.pitch.max(0.0);
        if self.cursor < length {
            return;
        }

        if self.looping && length > 0.0 {
            self.cursor %= length;
        } else {
            self.cursor = length;
            self.playing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(length: f32, looping: bool) -> Channel {
        let mut ch = Channel::new(looping);
        ch.assign(ClipHandle::new("clip", length));
        ch
    }

    #[test]
    fn play_without_clip_stays_silent() {
        let mut ch = Channel::new(false);
        ch.play();
        assert!(!ch.is_playing());
    }

    #[test]
    fn one_shot_finishes_at_clip_end() {
        let mut ch = loaded(1.0, false);
        ch.play();
        ch.advance(0.6);
        assert!(ch.is_playing());
        ch.advance(0.6);
        assert!(!ch.is_playing());
        assert_eq!(ch.cursor(), 1.0);
    }

    #[test]
    fn pitch_scales_playback_speed() {
        let mut ch = loaded(1.0, false);
        ch.set_pitch(2.0);
        ch.play();
        ch.advance(0.5);
        assert!(!ch.is_playing());
    }

    #[test]
    fn looping_wraps() {
        let mut ch = loaded(2.0, true);
        ch.play();
        ch.advance(5.0);
        assert!(ch.is_playing());
        assert!((ch.cursor() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn restart_rewinds() {
        let mut ch = loaded(2.0, false);
        ch.play();
        ch.advance(1.5);
        ch.play();
        assert_eq!(ch.cursor(), 0.0);
    }
}
