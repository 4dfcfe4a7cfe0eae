//! Random sources for leaf sampling
//!
//! Action leaves pick among their observed actions in proportion to how
//! often each was seen, which needs a uniform integer draw. The source is a
//! seam: anything implementing [`RandomSource`] can drive evaluation. The
//! crate ships a small seeded xorshift generator so evaluation is
//! reproducible without extra dependencies; enable the `rand` feature to
//! plug in any `rand::RngCore`.

/// Uniform integer generator over `[0, bound)`
pub trait RandomSource {
    /// Draw a value in `[0, bound)`. A `bound` of 0 is treated as 1.
    fn next_below(&mut self, bound: u32) -> u32;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_below(&mut self, bound: u32) -> u32 {
        (**self).next_below(bound)
    }
}

/// Seeded xorshift32 generator
///
/// Not cryptographic. Deterministic for a given seed, which keeps tests and
/// replays stable.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Create a generator from a seed (0 is remapped, xorshift needs a non-zero state)
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Next raw 32-bit value
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform index in `[0, n)`
    pub fn next_range(&mut self, n: usize) -> usize {
        let bound = u32::try_from(n).unwrap_or(u32::MAX);
        self.next_below(bound) as usize
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(42)
    }
}

impl RandomSource for Rng {
    fn next_below(&mut self, bound: u32) -> u32 {
        let bound = bound.max(1);
        // Multiply-shift maps 32 random bits onto [0, bound)
        ((self.next_u32() as u64 * bound as u64) >> 32) as u32
    }
}

/// Adapter for any `rand` generator
#[cfg(feature = "rand")]
#[derive(Debug, Clone)]
pub struct RandSource<R>(pub R);

#[cfg(feature = "rand")]
impl<R: rand::RngCore> RandomSource for RandSource<R> {
    fn next_below(&mut self, bound: u32) -> u32 {
        use rand::Rng as _;
        self.0.gen_range(0..bound.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = Rng::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn test_next_below_in_range() {
        let mut rng = Rng::new(123);
        for bound in [1u32, 2, 3, 10, 1000] {
            for _ in 0..200 {
                assert!(rng.next_below(bound) < bound);
            }
        }
        assert_eq!(rng.next_below(0), 0);
        assert!(rng.next_range(5) < 5);
    }

    #[test]
    fn test_roughly_uniform() {
        let mut rng = Rng::new(99);
        let mut buckets = [0u32; 4];
        for _ in 0..40_000 {
            buckets[rng.next_below(4) as usize] += 1;
        }
        for count in buckets {
            assert!((9_000..11_000).contains(&count), "bucket count {}", count);
        }
    }
}
