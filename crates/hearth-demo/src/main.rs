//! Headless composition root: wires the container, scheduler and mixer, then
//! runs a fixed number of frames and tears everything down.

mod assets;
mod systems;

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use hearth_audio::{AudioMixer, ClipLibrary, FootstepBank, MixerConfig, SurfaceClips};
use hearth_engine::core::{App, AppControl, FrameCtx};
use hearth_engine::logging::{init_logging, LoggingConfig};
use hearth_engine::runtime::{Runtime, RuntimeConfig};
use hearth_engine::services::{Provided, Release, ServiceContainer};
use hearth_engine::tick::TickScheduler;
use hearth_engine::time::TimeSource;

use assets::DemoAssets;
use systems::{BgmStarter, FootstepEmitter, Walker};

const FRAME_STEP: Duration = Duration::from_millis(16);
const FRAMES: u64 = 600;
const FADE_OUT_AT: u64 = 450;

const CATALOG: &[(&str, f32)] = &[
    ("river", 95.0),
    ("grass_0", 0.28),
    ("grass_1", 0.31),
    ("grass_2", 0.26),
];

struct Demo {
    assets: DemoAssets,
}

impl App for Demo {
    fn on_start(&mut self, services: &mut ServiceContainer) -> Result<()> {
        register_services(services, self.assets.clone());

        // Force construction of systems whose side effects must start now.
        services.resolve::<FootstepEmitter>().context("footsteps")?;
        services.resolve::<BgmStarter>().context("bgm")?;
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Ok(mixer) = ctx.services.resolve::<AudioMixer>() else {
            log::error!("mixer missing; stopping");
            return AppControl::Exit;
        };

        if ctx.time.frame_index == FADE_OUT_AT {
            log::info!("fading music out");
            mixer.stop_music(2.0);
        }

        // A real host would push this into its audio device every frame.
        if ctx.time.frame_index % 60 == 0 {
            let snap = mixer.snapshot();
            let music = &snap.music[snap.active_slot as usize];
            log::info!(
                "frame {:>3}: music {:?} vol {:.2}, {} sfx voices busy",
                ctx.time.frame_index,
                mixer.music_state(),
                music.volume(),
                snap.voices.iter().filter(|v| v.is_playing()).count(),
            );
        }

        if ctx.had_faults() {
            log::warn!("{} tick faults this frame", ctx.report.faults.len());
        }
        AppControl::Continue
    }

    fn on_shutdown(&mut self, services: &mut ServiceContainer) {
        if let Ok(footsteps) = services.resolve::<FootstepEmitter>() {
            log::info!("{} footsteps played", footsteps.steps.get());
        }
    }
}

fn register_services(c: &mut ServiceContainer, assets: DemoAssets) {
    c.register(Provided::releasable(Walker::default()));

    c.register_factory(|c| {
        let config = MixerConfig { seed: Some(7), ..MixerConfig::default() };
        Ok(Provided::releasable(AudioMixer::new(
            config,
            c.resolve::<dyn TimeSource>()?,
            c.resolve::<TickScheduler>()?,
        )))
    });

    let source = assets.clone();
    c.register_factory(move |c| {
        let library = Rc::new(ClipLibrary::new(source.clone()));
        let pump = source.pump_into(Rc::downgrade(&library), c.resolve::<TickScheduler>()?);
        let cache = Rc::clone(&library);
        Ok(Provided::shared(library).with_release(move || {
            pump.release()?;
            cache.release()
        }))
    });

    c.register_factory(move |_| {
        let grass = ["grass_0", "grass_1", "grass_2"]
            .into_iter()
            .filter_map(|key| assets.clip(key))
            .collect();
        let surfaces = vec![SurfaceClips { surface: "grass".into(), clips: grass }];
        Ok(Provided::new(FootstepBank::new(surfaces, StdRng::seed_from_u64(11))))
    });

    c.register_factory(|c| {
        let walker = c.resolve::<Walker>()?;
        let ticks = c.resolve::<TickScheduler>()?;
        walker.register(c.resolve::<dyn TimeSource>()?, &ticks);
        Ok(Provided::releasable(FootstepEmitter::new(
            walker,
            c.resolve::<FootstepBank>()?,
            c.resolve::<AudioMixer>()?,
            c.resolve::<TickScheduler>()?,
            5,
        )))
    });

    c.register_factory(|c| {
        let library = c.resolve::<ClipLibrary>()?;
        Ok(Provided::new(BgmStarter::new(&library, c.resolve::<AudioMixer>()?)))
    });
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut runtime = Runtime::new(RuntimeConfig::headless(FRAME_STEP, FRAMES));
    let mut demo = Demo { assets: DemoAssets::new(CATALOG) };

    let frames = runtime.run(&mut demo).context("demo run failed")?;
    log::info!("demo finished after {frames} frames");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_wires_services_and_tears_down_cleanly() {
        let mut runtime = Runtime::new(RuntimeConfig::headless(FRAME_STEP, 120));
        let mut demo = Demo { assets: DemoAssets::new(CATALOG) };
        demo.on_start(runtime.services()).unwrap();
        for _ in 0..120 {
            let (_, report) = runtime.step();
            assert!(report.faults.is_empty(), "{:?}", report.faults);
        }

        let mixer = runtime.services().resolve::<AudioMixer>().unwrap();
        assert_eq!(mixer.music_state(), hearth_audio::MusicState::Playing);
        assert!(runtime.services().resolve::<FootstepEmitter>().unwrap().steps.get() > 0);

        // scheduler, walker, mixer, library + pump, footsteps
        let report = runtime.shutdown();
        assert!(report.is_clean());
        assert_eq!(report.released, 5);
    }
}
