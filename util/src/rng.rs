use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// Construct a throwaway random number generator seeded by a noise value.
///
/// Good for short-term use in immutable contexts given a varying source of
/// noise like map position coordinates or an entity id.
pub fn srng(seed: &(impl Hash + ?Sized)) -> XorShiftRng {
    XorShiftRng::seed_from_u64(stable_hash(seed))
}

/// Hash a value with the fast hasher.
///
/// The result is stable between runs of the same build, so it can be used
/// to derive deterministic choices from ids.
pub fn stable_hash(seed: &(impl Hash + ?Sized)) -> u64 {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    h.finish()
}

pub trait RngExt {
    fn one_chance_in(&mut self, n: usize) -> bool;
}

impl<T: Rng + ?Sized> RngExt for T {
    fn one_chance_in(&mut self, n: usize) -> bool {
        if n == 0 {
            return false;
        }
        self.gen_range(0..n) == 0
    }
}
