#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The source of randomness threaded through a search.
//!
//! A search never touches a global generator: the caller hands it a
//! `RandomSource`, so a seeded `fastrand::Rng` reproduces a run exactly.

/// Uniform draws needed by the random walk.
pub trait RandomSource {
    /// A fair coin flip.
    fn bit(&mut self) -> bool;

    /// A uniform index in `0..bound`. `bound` is never zero.
    fn index(&mut self, bound: usize) -> usize;
}

impl RandomSource for fastrand::Rng {
    fn bit(&mut self) -> bool {
        self.bool()
    }

    fn index(&mut self, bound: usize) -> usize {
        self.usize(..bound)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn bit(&mut self) -> bool {
        (**self).bit()
    }

    fn index(&mut self, bound: usize) -> usize {
        (**self).index(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(42);
        for bound in 1..50 {
            assert!(rng.index(bound) < bound);
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = fastrand::Rng::with_seed(9);
        let mut b = fastrand::Rng::with_seed(9);
        let draws_a: Vec<usize> = (0..16).map(|_| a.index(10)).collect();
        let draws_b: Vec<usize> = (0..16).map(|_| b.index(10)).collect();
        assert_eq!(draws_a, draws_b);
    }
}
