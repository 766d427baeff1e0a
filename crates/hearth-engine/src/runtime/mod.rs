//! Frame driver.
//!
//! Hosts either call [`Runtime::advance`] from their own loop or hand an
//! [`crate::core::App`] to [`Runtime::run`] for a headless loop.

mod driver;

pub use driver::{Runtime, RuntimeConfig};
