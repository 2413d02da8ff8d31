//! Deterministic pseudo-random number generator.
//!
//! Synaptogenesis subsamples growth candidates; the generator is seeded so
//! that runs are reproducible across platforms.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A seeded pseudo-random number generator.
///
/// Uses ChaCha20 for high-quality randomness with deterministic behavior
/// when seeded.
///
/// # Example
///
/// ```rust
/// use veles::utils::Random;
///
/// let mut rng = Random::new(42);
///
/// let n = rng.get_uint32();
/// let idx = rng.get_uint32_range(0, 100);
///
/// let mut items: Vec<u32> = (0..10).collect();
/// rng.shuffle(&mut items);
/// ```
pub struct Random {
    rng: ChaCha20Rng,
    seed: u64,
}

impl Random {
    /// Creates a new random number generator with the given seed.
    ///
    /// A negative seed means use system randomness.
    #[must_use]
    pub fn new(seed: i64) -> Self {
        let actual_seed = if seed < 0 {
            rand::thread_rng().gen()
        } else {
            seed as u64
        };

        Self {
            rng: ChaCha20Rng::seed_from_u64(actual_seed),
            seed: actual_seed,
        }
    }

    /// Returns the seed used for this generator.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates a random u32.
    pub fn get_uint32(&mut self) -> u32 {
        self.rng.gen()
    }

    /// Generates a random u32 in the range [min, max).
    pub fn get_uint32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Generates a random usize in the range [0, n).
    pub fn get_usize(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Generates a random f32 in [0, 1).
    pub fn get_real32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Shuffles a slice in place using Fisher-Yates.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let n = slice.len();
        if n <= 1 {
            return;
        }

        for i in (1..n).rev() {
            let j = self.get_usize(i + 1);
            slice.swap(i, j);
        }
    }

    /// Samples `k` unique items from a collection without replacement.
    ///
    /// If `k >= items.len()`, returns a shuffled copy of all items.
    pub fn sample<T: Clone>(&mut self, mut items: Vec<T>, k: usize) -> Vec<T> {
        let n = items.len();
        if k >= n {
            self.shuffle(&mut items);
            return items;
        }

        // Partial Fisher-Yates, cheap when k << n.
        for i in 0..k {
            let j = self.get_usize(n - i) + i;
            items.swap(i, j);
        }

        items.truncate(k);
        items
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Random {
    fn clone(&self) -> Self {
        Self {
            rng: self.rng.clone(),
            seed: self.seed,
        }
    }
}

impl std::fmt::Debug for Random {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Random")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
