//! Environment abstraction for deterministic testing.
//!
//! Decouples the secret lifecycle from system resources (time, randomness).
//! Tests drive a virtual clock and a seeded RNG; production uses the system
//! clock and the OS RNG.

use std::time::Duration;

use vanish_proto::SecretId;

/// Time and randomness available to the core.
///
/// # Invariants
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production,
///   since secret ids are derived from it
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant type.
    ///
    /// Production uses `std::time::Instant`; simulations use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Sleep for `duration`.
    ///
    /// Only driver code (the expiry sweeper) sleeps. The service itself never
    /// waits.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Seconds since the Unix epoch.
    ///
    /// Durable stores record absolute deadlines with this so they survive a
    /// restart, which a monotonic instant cannot.
    fn wall_clock_secs(&self) -> u64;

    /// Generate a fresh secret id from 16 random bytes.
    fn secret_id(&self) -> SecretId {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        SecretId::from_random_bytes(bytes)
    }
}

#[cfg(test)]
pub(crate) mod test_env {
    #![allow(clippy::disallowed_types, reason = "Test clock state")]

    use std::sync::{Arc, Mutex};

    use super::{Duration, Environment};

    /// Manually advanced clock with a counter-based byte source.
    #[derive(Clone, Default)]
    pub(crate) struct TestEnv {
        elapsed: Arc<Mutex<Duration>>,
        counter: Arc<Mutex<u8>>,
    }

    impl TestEnv {
        pub(crate) fn advance(&self, by: Duration) {
            *self.elapsed.lock().unwrap() += by;
        }
    }

    impl Environment for TestEnv {
        type Instant = Duration;

        fn now(&self) -> Duration {
            *self.elapsed.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.advance(duration);
            async {}
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let mut counter = self.counter.lock().unwrap();
            *counter = counter.wrapping_add(1);
            buffer.fill(*counter);
        }

        fn wall_clock_secs(&self) -> u64 {
            1_700_000_000 + self.now().as_secs()
        }
    }
}
