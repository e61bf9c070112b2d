//! A thin-but-stable wrapper over `rand::rngs::SmallRng` that provides the
//! bounded and weighted choices the mutators need.

use rand::{rngs::SmallRng, Rng as _, SeedableRng};

pub(crate) const DEFAULT_SEED: u64 = 0x12345678_12345678;

/// A deterministic, replayable pseudorandom number generator.
///
/// Two `Rng`s created with the same seed produce the same sequence of choices,
/// which is what makes a recorded fuzzing sequence replayable.
///
/// Not cryptographically secure.
///
/// You can attain a reference to an `Rng` via the
/// [`Context::rng`][crate::Context::rng] method.
#[derive(Clone, Debug)]
pub struct Rng {
    inner: SmallRng,
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

macro_rules! gen_methods {
    ( $( $name:ident -> $ty:ty ; )* ) => {
        $(
            /// Generate a random
            #[doc = concat!("`", stringify!($ty), "`")]
            /// value.
            pub fn $name(&mut self) -> $ty {
                self.inner.gen()
            }
        )*
    };
}

impl Rng {
    /// Create a new `Rng` from the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generate a random `usize` in the range `0..len`.
    ///
    /// If `len` is `0`, then `None` is returned.
    #[inline]
    pub fn gen_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.inner.gen_range(0..len))
    }

    /// Generate a random `i64` in the inclusive range `min..=max`.
    ///
    /// If `min > max`, then `min` is returned.
    #[inline]
    pub fn gen_in_range(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Generate a random `usize` in the inclusive range `min..=max`.
    ///
    /// If `min > max`, then `min` is returned.
    #[inline]
    pub fn gen_len(&mut self, min: usize, max: usize) -> usize {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Return `true` with probability `1 / n`.
    ///
    /// Always returns `true` when `n <= 1`.
    #[inline]
    pub fn one_in(&mut self, n: u32) -> bool {
        n <= 1 || self.inner.gen_range(0..n) == 0
    }

    /// Choose an index into `weights`, with each index chosen proportionally
    /// to its weight.
    ///
    /// Returns `None` if `weights` is empty or every weight is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use mutatype::Rng;
    ///
    /// let mut rng = Rng::new(42);
    /// let index = rng.choose_weighted(&[0, 3, 0, 1]).unwrap();
    /// assert!(index == 1 || index == 3);
    /// ```
    pub fn choose_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
        if total == 0 {
            return None;
        }
        let mut target = self.inner.gen_range(0..total);
        for (i, w) in weights.iter().enumerate() {
            let w = u64::from(*w);
            if target < w {
                return Some(i);
            }
            target -= w;
        }
        unreachable!("target is always below the sum of the weights")
    }

    /// Choose a random element from an iterator.
    ///
    /// If the iterator is empty, then `None` is returned.
    #[inline]
    pub fn choose<I>(&mut self, iter: I) -> Option<I::Item>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
    {
        let mut iter = iter.into_iter();
        let idx = self.gen_index(iter.len())?;
        iter.nth(idx)
    }

    /// Generate random bytes to fill the provided `buf`.
    #[inline]
    pub fn gen_bytes(&mut self, buf: &mut [u8]) {
        self.inner.fill(buf);
    }

    gen_methods! {
        gen_char -> char;
        gen_bool -> bool;
        gen_u8 -> u8;
        gen_u32 -> u32;
        gen_u64 -> u64;
        gen_i64 -> i64;
        gen_f32 -> f32;
        gen_f64 -> f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_choices() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.gen_in_range(-50, 50), b.gen_in_range(-50, 50));
            assert_eq!(a.choose_weighted(&[1, 2, 3]), b.choose_weighted(&[1, 2, 3]));
        }
    }

    #[test]
    fn bounded_draws_stay_in_bounds() {
        let mut rng = Rng::default();
        for _ in 0..1000 {
            let x = rng.gen_in_range(-3, 3);
            assert!((-3..=3).contains(&x));
            let n = rng.gen_len(2, 5);
            assert!((2..=5).contains(&n));
            assert!(rng.gen_index(4).unwrap() < 4);
        }
        assert_eq!(rng.gen_index(0), None);
        assert_eq!(rng.gen_in_range(9, 9), 9);
    }

    #[test]
    fn zero_weights_are_never_chosen() {
        let mut rng = Rng::default();
        assert_eq!(rng.choose_weighted(&[]), None);
        assert_eq!(rng.choose_weighted(&[0, 0]), None);
        for _ in 0..100 {
            assert_eq!(rng.choose_weighted(&[0, 5, 0]), Some(1));
        }
    }
}
