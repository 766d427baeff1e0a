use std::fmt;

/// Failure to resolve a service from a [`super::ServiceContainer`].
///
/// Resolution failures are fatal to the caller: there is no fallback value
/// and no retry. Propagate with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// No entry exists for the requested type.
    NotRegistered { type_name: &'static str },
    /// A lazy factory asked for its own type while it was still being built.
    CyclicResolve { type_name: &'static str },
}

impl ContainerError {
    /// Name of the type the failed request was made for.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::NotRegistered { type_name } | Self::CyclicResolve { type_name } => type_name,
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered { type_name } => {
                write!(f, "service of type {type_name} not registered")
            }
            Self::CyclicResolve { type_name } => {
                write!(f, "service of type {type_name} resolved itself during construction")
            }
        }
    }
}

impl std::error::Error for ContainerError {}

/// A release hook that failed during [`super::ServiceContainer::dispose`].
///
/// Teardown faults are isolated: the remaining hooks still run.
#[derive(Debug, Clone, PartialEq)]
pub struct TeardownFault {
    /// Position of the hook in the teardown order (0-based).
    pub index: usize,
    /// Type the hook was attached to.
    pub type_name: &'static str,
    pub message: String,
}

impl fmt::Display for TeardownFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "release hook #{} for {} failed: {}",
            self.index, self.type_name, self.message
        )
    }
}

impl std::error::Error for TeardownFault {}

/// Outcome of a container teardown.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Hooks that completed without a fault.
    pub released: usize,
    pub faults: Vec<TeardownFault>,
}

impl TeardownReport {
    /// Total number of hooks that were run.
    #[inline]
    pub fn attempted(&self) -> usize {
        self.released + self.faults.len()
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}
