//! Hearth engine crate.
//!
//! Host-agnostic runtime substrate that decouples game logic from an external
//! engine's update loop:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`services`] | `ServiceContainer`: fixed / lazy / transient lifetimes, ordered teardown |
//! | [`tick`] | `TickScheduler`: deterministic per-frame callbacks in priority tiers |
//! | [`time`] | `TimeSource`, `DeltaTime`, `FrameClock` |
//! | [`runtime`] | `Runtime`: owns the above and drives one pass per frame |
//! | [`core`] | `App` contract for composition roots |
//! | [`logging`] | one-time `env_logger` setup |
//!
//! Everything here is single-threaded: state is shared with `Rc` and mutated
//! from one logical thread, once per external frame pulse.

pub mod core;
pub mod logging;
pub mod runtime;
pub mod services;
pub mod tick;
pub mod time;

mod fault;
