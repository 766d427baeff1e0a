use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use hearth_audio::{ClipHandle, ClipLibrary, ClipSource};
use hearth_engine::services::Release;
use hearth_engine::tick::{TickId, TickPriority, TickScheduler};

/// Simulated asset store: requests complete on the frame after they are made.
#[derive(Clone)]
pub struct DemoAssets {
    catalog: Rc<HashMap<&'static str, f32>>,
    requests: Rc<RefCell<VecDeque<String>>>,
}

impl DemoAssets {
    /// `(key, length in seconds)` pairs.
    pub fn new(catalog: &[(&'static str, f32)]) -> Self {
        Self {
            catalog: Rc::new(catalog.iter().copied().collect()),
            requests: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn clip(&self, key: &str) -> Option<ClipHandle> {
        self.catalog.get(key).map(|&len| ClipHandle::new(key, len))
    }

    /// Registers the tick that delivers queued loads to `library`.
    pub fn pump_into(&self, library: Weak<ClipLibrary>, ticks: Rc<TickScheduler>) -> AssetPump {
        let assets = self.clone();
        let tick = ticks.add_tick(TickPriority::Normal, move || {
            let Some(library) = library.upgrade() else { return Ok(()) };
            // Drain first: completions may enqueue further requests.
            let batch: Vec<String> = assets.requests.borrow_mut().drain(..).collect();
            for key in batch {
                let result = assets
                    .clip(&key)
                    .ok_or_else(|| anyhow::anyhow!("no asset named '{key}'"));
                library.complete(&key, result);
            }
            Ok(())
        });
        AssetPump { ticks, tick }
    }
}

/// The delivery tick installed by [`DemoAssets::pump_into`].
pub struct AssetPump {
    ticks: Rc<TickScheduler>,
    tick: TickId,
}

impl Release for AssetPump {
    fn release(&self) -> anyhow::Result<()> {
        self.ticks.remove_tick(self.tick);
        Ok(())
    }
}

impl ClipSource for DemoAssets {
    fn begin_load(&self, key: &str) {
        log::debug!("asset request: {key}");
        self.requests.borrow_mut().push_back(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_complete_on_the_next_frame() {
        let assets = DemoAssets::new(&[("river", 95.0)]);
        let ticks = Rc::new(TickScheduler::new());
        let library = Rc::new(ClipLibrary::new(assets.clone()));
        let _pump = assets.pump_into(Rc::downgrade(&library), Rc::clone(&ticks));

        library.preload("river");
        library.preload("missing");
        assert!(library.is_loading("river"));

        ticks.update();
        assert!(library.is_loaded("river"));
        assert!(!library.is_loading("missing"));
        assert!(!library.is_loaded("missing"));
    }

    #[test]
    fn releasing_the_pump_removes_its_tick() {
        let assets = DemoAssets::new(&[]);
        let ticks = Rc::new(TickScheduler::new());
        let library = Rc::new(ClipLibrary::new(assets.clone()));
        let pump = assets.pump_into(Rc::downgrade(&library), Rc::clone(&ticks));
        assert_eq!(ticks.len(), 1);

        pump.release().unwrap();
        assert!(ticks.is_empty());
    }
}
