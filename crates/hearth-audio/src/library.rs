use std::cell::RefCell;
use std::collections::HashMap;

use hearth_engine::services::Release;

use crate::clip::ClipHandle;

/// Starts loading a clip. The loading protocol belongs to the host; when it
/// finishes it reports back through [`ClipLibrary::complete`].
pub trait ClipSource {
    fn begin_load(&self, key: &str);
}

impl<F: Fn(&str)> ClipSource for F {
    fn begin_load(&self, key: &str) {
        self(key)
    }
}

type OnLoaded = Box<dyn FnOnce(&ClipHandle)>;

#[derive(Default)]
struct LibraryState {
    cache: HashMap<String, ClipHandle>,
    /// Keys with a load in flight, and the callbacks waiting on them.
    pending: HashMap<String, Vec<OnLoaded>>,
    released: bool,
}

/// Keyed clip cache with de-duplicated loads.
///
/// - a cached key calls back immediately
/// - a key already loading queues the callback
/// - otherwise the key is marked loading and the [`ClipSource`] is asked for it
///
/// Callbacks always run with the library unborrowed, so they may call back
/// into it. After [`Release::release`] every operation is a no-op.
pub struct ClipLibrary {
    source: Box<dyn ClipSource>,
    state: RefCell<LibraryState>,
}

impl ClipLibrary {
    pub fn new(source: impl ClipSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            state: RefCell::new(LibraryState::default()),
        }
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.state.borrow().cache.contains_key(key)
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.state.borrow().pending.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<ClipHandle> {
        self.state.borrow().cache.get(key).cloned()
    }

    /// Requests `key` without waiting for it.
    pub fn preload(&self, key: &str) {
        self.request(key, None);
    }

    /// Requests `key` and calls `on_loaded` once it is available.
    pub fn load<F>(&self, key: &str, on_loaded: F)
    where
        F: FnOnce(&ClipHandle) + 'static,
    {
        self.request(key, Some(Box::new(on_loaded)));
    }

    /// Reports the outcome of a load started through [`ClipSource::begin_load`].
    ///
    /// On success the clip is cached and waiting callbacks run in request
    /// order. On failure the error is logged and the waiting callbacks are
    /// dropped; a later `load` starts a fresh attempt.
    pub fn complete(&self, key: &str, result: anyhow::Result<ClipHandle>) {
        let waiting = {
            let mut state = self.state.borrow_mut();
            if state.released {
                return;
            }
            let waiting = state.pending.remove(key).unwrap_or_default();
            match result {
                Ok(clip) => {
                    state.cache.insert(key.to_string(), clip.clone());
                    Some((clip, waiting))
                }
                Err(err) => {
                    log::error!("failed to load clip '{key}': {err:#}");
                    None
                }
            }
        };

        if let Some((clip, waiting)) = waiting {
            log::debug!("clip '{key}' loaded ({} waiting)", waiting.len());
            for callback in waiting {
                callback(&clip);
            }
        }
    }

    fn request(&self, key: &str, on_loaded: Option<OnLoaded>) {
        let start = {
            let mut state = self.state.borrow_mut();
            if state.released {
                return;
            }

            if let Some(clip) = state.cache.get(key).cloned() {
                drop(state);
                if let Some(callback) = on_loaded {
                    callback(&clip);
                }
                return;
            }

            match state.pending.get_mut(key) {
                Some(waiting) => {
                    waiting.extend(on_loaded);
                    false
                }
                None => {
                    state.pending.insert(key.to_string(), on_loaded.into_iter().collect());
                    true
                }
            }
        };

        if start {
            self.source.begin_load(key);
        }
    }
}

impl Release for ClipLibrary {
    fn release(&self) -> anyhow::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.released {
            return Ok(());
        }
        state.released = true;
        let clips = state.cache.len();
        state.cache.clear();
        state.pending.clear();
        log::debug!("clip library released ({clips} clips)");
        Ok(())
    }
}
