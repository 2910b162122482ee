//! Process-wide seedable random generator
//!
//! Sampling functions draw from a single shared generator so that a run
//! can be reproduced by seeding once up front. Results of sampling calls
//! are never cached; each evaluation draws fresh values.

use std::sync::Mutex;

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seed used until [`seed`] is called
pub const DEFAULT_SEED: u64 = 0;

static GENERATOR: Lazy<Mutex<StdRng>> =
    Lazy::new(|| Mutex::new(StdRng::seed_from_u64(DEFAULT_SEED)));

/// Re-seed the shared generator
pub fn seed(value: u64) {
    let mut rng = lock();
    *rng = StdRng::seed_from_u64(value);
}

/// Restore the generator to its initial state
pub fn reset() {
    seed(DEFAULT_SEED);
}

pub(crate) fn with_generator<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut rng = lock();
    f(&mut rng)
}

fn lock() -> std::sync::MutexGuard<'static, StdRng> {
    GENERATOR.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// serializes tests that seed the shared generator
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = Mutex::new(());

#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
