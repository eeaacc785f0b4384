//! Seedable uniform choice over fixed sets
//!
//! Anti-idle actions, ping replies and mention greetings are all uniform
//! picks from small fixed sets. They share one generator so a configured
//! seed makes a whole run reproducible.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shared, cloneable random source
#[derive(Clone)]
pub struct SharedRng {
    inner: Arc<Mutex<StdRng>>,
}

impl SharedRng {
    /// Generator seeded from the operating system
    #[must_use]
    pub fn from_os() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic generator for reproducible runs and tests
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Seeded when `seed` is given, OS-seeded otherwise
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_os, Self::seeded)
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rng)),
        }
    }

    /// Uniformly pick one element of a non-empty slice
    ///
    /// Returns `None` only for an empty slice.
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.inner.lock().random_range(0..items.len());
        items.get(index)
    }
}

impl std::fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedRng")
    }
}
