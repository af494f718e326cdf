//! Deterministic test harness for vanish.
//!
//! [`SimEnv`] implements [`Environment`](vanish_core::Environment) with a
//! virtual clock that only moves when told to and a seeded RNG, so secret
//! ids and expiry are reproducible across runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;

pub use sim_env::{SimEnv, SimInstant};
