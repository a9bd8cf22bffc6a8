//! Deterministic Simulation Testing (DST) kit
//!
//! `TigerStyle`: Simulation-first. Every nondeterministic input (time,
//! randomness, failures) has a controllable stand-in so tests reproduce
//! exactly from a seed.

mod clock;
mod fault;
mod rng;

pub use clock::{SimClock, TimeSource};
pub use fault::{FaultConfig, FaultInjector, FaultType};
pub use rng::DeterministicRng;
