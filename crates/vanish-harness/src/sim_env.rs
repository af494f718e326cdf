//! Simulated environment: virtual time and seeded randomness.

#![allow(clippy::disallowed_types, reason = "Synchronous locking of simulation state")]

use std::{
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use vanish_core::Environment;

/// Wall clock value at simulation start (2023-11-14T22:13:20Z)
const EPOCH_START_SECS: u64 = 1_700_000_000;

/// Point in virtual time, measured from the start of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time elapsed since the simulation started.
    pub fn elapsed(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

/// Environment with a virtual clock and a seeded ChaCha20 RNG.
///
/// Clones share the clock and the RNG. Time advances only through
/// [`advance`](Self::advance) or [`sleep`](Environment::sleep), which returns
/// immediately after moving the clock.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

struct SimState {
    elapsed: Duration,
    rng: ChaCha20Rng,
}

impl SimEnv {
    /// Start a simulation at time zero with the given RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                elapsed: Duration::ZERO,
                rng: ChaCha20Rng::seed_from_u64(seed),
            })),
        }
    }

    /// Move the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, by: Duration) {
        self.state.lock().expect("SimEnv mutex poisoned").elapsed += by;
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    #[allow(clippy::expect_used)]
    fn now(&self) -> SimInstant {
        SimInstant(self.state.lock().expect("SimEnv mutex poisoned").elapsed)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.state.lock().expect("SimEnv mutex poisoned").rng.fill_bytes(buffer);
    }

    fn wall_clock_secs(&self) -> u64 {
        EPOCH_START_SECS + self.now().elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_moves_only_when_advanced() {
        let env = SimEnv::with_seed(0);
        let start = env.now();
        assert_eq!(env.now(), start);

        env.advance(Duration::from_secs(90));
        assert_eq!(env.now() - start, Duration::from_secs(90));
        assert_eq!(env.wall_clock_secs(), EPOCH_START_SECS + 90);
    }

    #[test]
    fn clones_share_clock() {
        let env = SimEnv::with_seed(0);
        let clone = env.clone();
        clone.advance(Duration::from_secs(5));
        assert_eq!(env.now().elapsed(), Duration::from_secs(5));
    }

    #[test]
    fn same_seed_same_ids() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        for _ in 0..10 {
            assert_eq!(a.secret_id(), b.secret_id());
        }
        assert_ne!(SimEnv::with_seed(8).secret_id(), SimEnv::with_seed(7).secret_id());
    }

    #[test]
    fn sleep_advances_clock() {
        let env = SimEnv::with_seed(0);
        let _pending = env.sleep(Duration::from_secs(3));
        assert_eq!(env.now().elapsed(), Duration::from_secs(3));
    }
}
