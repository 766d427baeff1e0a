//! Hearth audio crate.
//!
//! A host-agnostic mixer state machine. The host owns the real audio device
//! and mirrors [`AudioMixer::snapshot`] into it; the mixer owns the decisions:
//!
//! - **music**: two looping slots, one active; a new track crossfades from the
//!   active slot to the inactive one, then the two swap roles
//! - **sfx**: a fixed pool of one-shot voices; when all are busy the
//!   oldest-started voice is reused
//!
//! Fade progress and voice reclamation run as ticks on a
//! [`hearth_engine::tick::TickScheduler`], reading the frame delta from a
//! [`hearth_engine::time::TimeSource`].

mod channel;
mod clip;
mod footsteps;
mod library;
mod mixer;
mod music;
mod sfx;

pub use channel::Channel;
pub use clip::{AudioClip, ClipHandle};
pub use footsteps::{FootstepBank, SurfaceClips};
pub use library::{ClipLibrary, ClipSource};
pub use mixer::{AudioMixer, MixerConfig, MixerSnapshot};
pub use music::{FadeJob, MusicState, SlotId};
pub use sfx::VoiceId;
