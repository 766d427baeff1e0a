use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::rc::Rc;

use crate::fault;

use super::error::{ContainerError, TeardownFault, TeardownReport};
use super::provided::{Provided, ReleaseHook};

/// Type-erased `Rc<T>`.
type Stored = Box<dyn Any>;

type ErasedFactory = Box<dyn FnMut(&mut ServiceContainer) -> Result<Produced, ContainerError>>;

struct Produced {
    value: Stored,
    release: Option<ReleaseHook>,
}

enum Entry {
    /// Registered instance; always resolves to the same value.
    Fixed(Stored),
    /// Factory-backed entry.
    ///
    /// `factory` is `None` while the factory is running (it is moved out so it can
    /// receive `&mut ServiceContainer`). `cached` is only ever filled for lazy
    /// singletons.
    Factory {
        factory: Option<ErasedFactory>,
        cached: Option<Stored>,
        memoize: bool,
    },
}

/// Type-keyed service registry with explicit lifetimes and ordered teardown.
///
/// Lifetimes:
/// - [`register`](Self::register): fixed instance
/// - [`register_factory`](Self::register_factory): lazy singleton, built on first resolve
/// - [`register_transient`](Self::register_transient): new instance on every resolve
///
/// Release hooks are queued in the order instances are *produced*, which for
/// lazy and transient entries is resolve order, not registration order.
///
/// Re-registering a type replaces the previous entry. The previous instance is
/// not released at that point; its hook (if already queued) still runs at
/// [`dispose`](Self::dispose).
///
/// The container is single-threaded and is meant to be passed explicitly to
/// whatever needs it. There is no global accessor.
#[derive(Default)]
pub struct ServiceContainer {
    entries: HashMap<TypeId, Entry>,
    disposables: Vec<(&'static str, ReleaseHook)>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fixed instance. Its release hook (if any) is queued immediately.
    pub fn register<T>(&mut self, provided: Provided<T>) -> &mut Self
    where
        T: ?Sized + 'static,
    {
        let Provided { value, release } = provided;
        if let Some(hook) = release {
            self.disposables.push((type_name::<T>(), hook));
        }
        self.insert::<T>(Entry::Fixed(Box::new(value)));
        self
    }

    /// Stores a lazy singleton factory.
    ///
    /// The factory does not run here. It runs exactly once, on the first
    /// successful [`resolve`](Self::resolve); the result is cached and its release
    /// hook queued at that moment.
    pub fn register_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + 'static,
        F: FnMut(&mut ServiceContainer) -> Result<Provided<T>, ContainerError> + 'static,
    {
        self.insert::<T>(Entry::Factory {
            factory: Some(erase(factory)),
            cached: None,
            memoize: true,
        });
        self
    }

    /// Stores a transient factory. Every resolve produces a new instance and
    /// queues that instance's release hook.
    pub fn register_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + 'static,
        F: FnMut(&mut ServiceContainer) -> Result<Provided<T>, ContainerError> + 'static,
    {
        self.insert::<T>(Entry::Factory {
            factory: Some(erase(factory)),
            cached: None,
            memoize: false,
        });
        self
    }

    /// Returns the stored or produced value for `T`.
    ///
    /// # Errors
    /// - [`ContainerError::NotRegistered`] if there is no entry for `T`
    /// - [`ContainerError::CyclicResolve`] if `T`'s factory is already running
    /// - any error returned by the factory itself
    pub fn resolve<T>(&mut self) -> Result<Rc<T>, ContainerError>
    where
        T: ?Sized + 'static,
    {
        let key = TypeId::of::<T>();
        let name = type_name::<T>();

        let mut factory = match self.entries.get_mut(&key) {
            None => return Err(ContainerError::NotRegistered { type_name: name }),
            Some(Entry::Fixed(value)) => return Ok(downcast::<T>(value)),
            Some(Entry::Factory { cached: Some(value), .. }) => return Ok(downcast::<T>(value)),
            Some(Entry::Factory { factory, .. }) => match factory.take() {
                Some(f) => f,
                None => return Err(ContainerError::CyclicResolve { type_name: name }),
            },
        };

        let produced = factory(self);

        // The factory may have re-registered `T`; only restore our own entry.
        let entry = self.entries.get_mut(&key);
        let (slot, cache) = match entry {
            Some(Entry::Factory { factory: slot @ None, cached, memoize }) => {
                (Some(slot), if *memoize { Some(cached) } else { None })
            }
            _ => (None, None),
        };
        if let Some(slot) = slot {
            *slot = Some(factory);
        }

        let Produced { value, release } = produced?;
        let out = downcast::<T>(&value);

        if let Some(hook) = release {
            self.disposables.push((name, hook));
        }
        if let Some(cached) = cache {
            log::debug!("lazy service {name} constructed");
            *cached = Some(value);
        }

        Ok(out)
    }

    /// Returns `true` if an entry exists for `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of release hooks waiting for teardown.
    pub fn pending_releases(&self) -> usize {
        self.disposables.len()
    }

    /// Runs every queued release hook in production order.
    ///
    /// Each hook runs inside its own failure boundary: an error or panic is
    /// logged and recorded in the report, and the next hook still runs. The
    /// queue is empty afterwards, so calling this again is a no-op.
    pub fn dispose(&mut self) -> TeardownReport {
        let hooks = std::mem::take(&mut self.disposables);
        let mut report = TeardownReport::default();

        for (index, (type_name, hook)) in hooks.into_iter().enumerate() {
            match fault::isolate(hook) {
                Ok(()) => report.released += 1,
                Err(message) => {
                    let fault = TeardownFault { index, type_name, message };
                    log::error!("{fault}");
                    report.faults.push(fault);
                }
            }
        }

        if report.attempted() > 0 {
            log::info!(
                "disposed {} services ({} faults)",
                report.released,
                report.faults.len()
            );
        }
        report
    }

    fn insert<T: ?Sized + 'static>(&mut self, entry: Entry) {
        if self.entries.insert(TypeId::of::<T>(), entry).is_some() {
            log::warn!(
                "service {} re-registered; previous instance is not released until dispose",
                type_name::<T>()
            );
        }
    }
}

impl Drop for ServiceContainer {
    fn drop(&mut self) {
        if !self.disposables.is_empty() {
            self.dispose();
        }
    }
}

fn erase<T, F>(mut factory: F) -> ErasedFactory
where
    T: ?Sized + 'static,
    F: FnMut(&mut ServiceContainer) -> Result<Provided<T>, ContainerError> + 'static,
{
    Box::new(move |container| {
        let Provided { value, release } = factory(container)?;
        Ok(Produced { value: Box::new(value), release })
    })
}

fn downcast<T: ?Sized + 'static>(stored: &Stored) -> Rc<T> {
    // Keys are `TypeId::of::<T>()` and values are always `Rc<T>`.
    stored
        .downcast_ref::<Rc<T>>()
        .map(Rc::clone)
        .expect("service entry stored under a foreign type key")
}
