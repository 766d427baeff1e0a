//! Service container.
//!
//! A small dependency registry with three lifetimes (fixed, lazy singleton,
//! transient) and ordered teardown of everything that registered a release hook.
//! Composition roots own one [`ServiceContainer`] and pass it (or the services
//! resolved from it) to whatever needs them.

mod container;
mod error;
mod provided;

pub use container::ServiceContainer;
pub use error::{ContainerError, TeardownFault, TeardownReport};
pub use provided::{Provided, Release, ReleaseHook};
