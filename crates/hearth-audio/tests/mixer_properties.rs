//! Mixer behaviour through the full engine stack: container-built mixer,
//! runtime-driven frames.

use std::cell::Cell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hearth_audio::{AudioMixer, ClipHandle, MixerConfig, MusicState};
use hearth_engine::runtime::{Runtime, RuntimeConfig};
use hearth_engine::services::Provided;
use hearth_engine::tick::{TickPriority, TickScheduler};
use hearth_engine::time::TimeSource;

fn runtime_with_mixer(pool: usize) -> (Runtime, Rc<AudioMixer>) {
    let mut rt = Runtime::new(RuntimeConfig::default());
    rt.services().register_factory(move |c| {
        let config = MixerConfig { sfx_pool_size: pool, seed: Some(42), ..MixerConfig::default() };
        Ok(Provided::releasable(AudioMixer::new(
            config,
            c.resolve::<dyn TimeSource>()?,
            c.resolve::<TickScheduler>()?,
        )))
    });
    let mixer = rt.services().resolve::<AudioMixer>().unwrap();
    (rt, mixer)
}

fn clip(name: &str, length: f32) -> Option<ClipHandle> {
    Some(ClipHandle::new(name, length))
}

#[test]
fn crossfade_over_two_frames() {
    let (mut rt, mixer) = runtime_with_mixer(4);
    let x = clip("x", 90.0);
    let y = clip("y", 90.0);

    mixer.play_music(x.clone(), 2.0);
    let x_slot = mixer.active_slot();
    assert_eq!(mixer.music_slot(x_slot).volume(), 1.0);
    assert_eq!(mixer.music_state(), MusicState::Playing);

    mixer.play_music(y.clone(), 2.0);
    rt.advance(1.0);
    rt.advance(1.0);

    let old = mixer.music_slot(x_slot);
    let new = mixer.music_slot(mixer.active_slot());
    assert_ne!(mixer.active_slot(), x_slot);
    assert_eq!(old.clip(), x.as_ref());
    assert!(old.volume().abs() < 1e-5);
    assert!(!old.is_playing());
    assert_eq!(new.clip(), y.as_ref());
    assert!((new.volume() - 1.0).abs() < 1e-5);
    assert!(new.is_playing());
}

#[test]
fn overlapping_crossfade_restarts_from_active_slot() {
    let (mut rt, mixer) = runtime_with_mixer(1);
    mixer.play_music(clip("x", 90.0), 0.0);
    let a = mixer.active_slot();
    mixer.play_music(clip("y", 90.0), 2.0);
    rt.advance(1.0);

    // Preempt: the inactive slot is reloaded, the new job starts from zero.
    mixer.play_music(clip("z", 90.0), 2.0);
    let job = mixer.fade_job().unwrap();
    assert_eq!(job.from, a);
    assert_eq!(job.progress, 0.0);
    assert_eq!(mixer.music_slot(a.other()).clip().unwrap().name(), "z");

    rt.advance(2.0);
    assert_eq!(mixer.active_slot(), a.other());
    assert_eq!(mixer.music_state(), MusicState::Playing);
}

/// Registers a Normal tick, ahead of any fade tick, that runs `action` during
/// frame `at`.
fn on_frame(rt: &Runtime, mixer: &Rc<AudioMixer>, at: u32, action: fn(&AudioMixer)) {
    let mixer = Rc::clone(mixer);
    let frame = Cell::new(0);
    rt.scheduler().add_tick(TickPriority::Normal, move || {
        frame.set(frame.get() + 1);
        if frame.get() == at {
            action(&mixer);
        }
        Ok(())
    });
}

#[test]
fn fade_restarted_mid_pass_starts_fresh() {
    let (mut rt, mixer) = runtime_with_mixer(1);
    on_frame(&rt, &mixer, 2, |m| m.play_music(clip("z", 90.0), 4.0));

    mixer.play_music(clip("x", 90.0), 0.0);
    let a = mixer.active_slot();
    mixer.play_music(clip("y", 90.0), 2.0);
    rt.advance(1.0);
    rt.advance(1.0);

    // The replaced fade tick still ran in frame 2 but left the new job alone.
    let job = mixer.fade_job().unwrap();
    assert_eq!(job.progress, 0.0);
    assert_eq!(job.from, a);
    assert_eq!(mixer.active_slot(), a);
    assert_eq!(mixer.music_slot(a.other()).clip().unwrap().name(), "z");
    assert_eq!(rt.scheduler().len(), 3);

    rt.advance(1.0);
    assert_eq!(mixer.fade_job().unwrap().progress, 1.0);
    rt.advance(3.0);
    assert_eq!(mixer.music_state(), MusicState::Playing);
    assert_eq!(mixer.active_slot(), a.other());
    assert_eq!(rt.scheduler().len(), 2);
}

#[test]
fn immediate_stop_mid_pass_cancels_fade() {
    let (mut rt, mixer) = runtime_with_mixer(1);
    on_frame(&rt, &mixer, 2, |m| m.stop_music(0.0));

    mixer.play_music(clip("x", 90.0), 0.0);
    let a = mixer.active_slot();
    mixer.play_music(clip("y", 90.0), 4.0);
    rt.advance(1.0);
    rt.advance(1.0);

    assert!(mixer.fade_job().is_none());
    assert_eq!(mixer.music_state(), MusicState::Idle);
    assert_eq!(mixer.active_slot(), a);
    assert!(!mixer.music_slot(a).is_playing());
    // Volumes stay where the first frame left them.
    assert!((mixer.music_slot(a.other()).volume() - 0.25).abs() < 1e-5);
    assert_eq!(rt.scheduler().len(), 2);
}

#[test]
fn third_sfx_steals_first_voice() {
    let (_rt, mixer) = runtime_with_mixer(2);
    let va = mixer.play_sfx(clip("a", 5.0), 1.0, 0.0).unwrap();
    let vb = mixer.play_sfx(clip("b", 5.0), 1.0, 0.0).unwrap();
    let vc = mixer.play_sfx(clip("c", 5.0), 1.0, 0.0).unwrap();

    assert_ne!(va, vb);
    assert_eq!(vc, va);
    assert_eq!(mixer.active_voices(), vec![vb, va]);
    assert_eq!(mixer.voice(va).unwrap().clip().unwrap().name(), "c");
}

#[test]
fn pool_partition_holds_under_random_traffic() {
    const POOL: usize = 4;
    let (mut rt, mixer) = runtime_with_mixer(POOL);
    let mut rng = StdRng::seed_from_u64(99);

    for step in 0..500 {
        if rng.gen_bool(0.6) {
            let length = rng.gen_range(0.05..1.5);
            let played = mixer.play_sfx(clip("fx", length), rng.gen_range(-0.5..1.5), 0.1);
            assert!(played.is_some(), "step {step}: no voice");
        } else {
            rt.advance(rng.gen_range(0.0..0.4));
        }

        let active = mixer.active_voices();
        assert_eq!(mixer.free_voices() + active.len(), POOL, "step {step}");
        let mut unique = active.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), active.len(), "step {step}: duplicate active voice");
    }
}

#[test]
fn container_teardown_releases_mixer() {
    let (mut rt, mixer) = runtime_with_mixer(2);
    mixer.play_music(clip("x", 90.0), 0.0);
    mixer.play_music(clip("y", 90.0), 5.0);
    assert_eq!(rt.scheduler().len(), 2);

    let report = rt.shutdown();
    assert!(report.is_clean());
    assert!(rt.scheduler().is_empty());
    assert_eq!(mixer.music_state(), MusicState::Idle);
}
