use std::rc::Rc;

/// Capability of a service that owns resources needing explicit teardown.
///
/// Release runs exactly once, from [`super::ServiceContainer::dispose`], in the
/// order the instances were produced.
pub trait Release {
    fn release(&self) -> anyhow::Result<()>;
}

/// Teardown function attached to one produced instance.
pub type ReleaseHook = Box<dyn FnOnce() -> anyhow::Result<()>>;

/// A produced service value plus its optional release hook.
///
/// The hook is attached explicitly by whoever builds the value; the container
/// never probes a value for a teardown capability.
pub struct Provided<T: ?Sized> {
    pub(crate) value: Rc<T>,
    pub(crate) release: Option<ReleaseHook>,
}

impl<T: 'static> Provided<T> {
    /// A value without teardown.
    pub fn new(value: T) -> Self {
        Self { value: Rc::new(value), release: None }
    }
}

impl<T: Release + 'static> Provided<T> {
    /// A value whose [`Release::release`] runs at container teardown.
    pub fn releasable(value: T) -> Self {
        Self::shared(Rc::new(value)).with_release_of_self()
    }
}

impl<T: ?Sized + 'static> Provided<T> {
    /// Wraps an already shared value. Use this to register trait objects:
    /// `Provided::<dyn TimeSource>::shared(rc)`.
    pub fn shared(value: Rc<T>) -> Self {
        Self { value, release: None }
    }

    /// Attaches a custom release hook, replacing any previous one.
    pub fn with_release<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }

    /// Attaches a hook that calls [`Release::release`] on the value itself.
    pub fn with_release_of_self(self) -> Self
    where
        T: Release,
    {
        let target = Rc::clone(&self.value);
        self.with_release(move || target.release())
    }

    #[inline]
    pub fn value(&self) -> &Rc<T> {
        &self.value
    }

    #[inline]
    pub fn has_release(&self) -> bool {
        self.release.is_some()
    }
}
