use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

/// Construct a throwaway random number generator seeded by a noise value.
///
/// Good for short-term use in immutable contexts given a varying source of
/// noise like map position coordinates.
pub fn srng(seed: &(impl Hash + ?Sized)) -> XorShiftRng {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    XorShiftRng::seed_from_u64(h.finish())
}

pub trait RngExt {
    /// Roll a six-sided die.
    fn d6(&mut self) -> i32;
}

impl<T: Rng + ?Sized> RngExt for T {
    fn d6(&mut self) -> i32 {
        self.gen_range(1..=6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn die_range() {
        let mut rng = srng("dice");
        for _ in 0..1000 {
            let roll = rng.d6();
            assert!((1..=6).contains(&roll));
        }
    }

    #[test]
    fn seeded_rngs_repeat() {
        let mut r1 = srng("seed");
        let mut r2 = srng("seed");
        let a: Vec<i32> = (0..16).map(|_| r1.d6()).collect();
        let b: Vec<i32> = (0..16).map(|_| r2.d6()).collect();
        assert_eq!(a, b);
    }
}
