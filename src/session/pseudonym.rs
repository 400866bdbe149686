// src/session/pseudonym.rs — Fake display names for pseudonymization

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::infra::errors::{Result, StudyError};

pub const FIRST_NAMES: [&str; 26] = [
    "Alex", "Bailey", "Cameron", "Dakota", "Ellis", "Finley", "Gray", "Harper", "Indigo",
    "Jordan", "Kennedy", "Logan", "Morgan", "Noah", "Oakley", "Parker", "Quinn", "Riley",
    "Sawyer", "Taylor", "Ursa", "Val", "Winter", "Xen", "Yael", "Zephyr",
];

pub const LAST_NAMES: [&str; 26] = [
    "Adams", "Brooks", "Chen", "Davis", "Evans", "Foster", "Garcia", "Hayes", "Ivanov",
    "Johnson", "Kim", "Lee", "Miller", "Nguyen", "Ortiz", "Patel", "Quinn", "Robinson", "Smith",
    "Taylor", "Ueda", "Vargas", "Williams", "Xu", "Young", "Zhang",
];

/// Random draws before falling back to a linear scan for a free name.
const RANDOM_ATTEMPTS: usize = 64;

/// Hands out `First_Last` names, never the same one twice per generator.
pub struct PseudonymGenerator {
    rng: StdRng,
    issued: HashSet<String>,
}

impl Default for PseudonymGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PseudonymGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            issued: HashSet::new(),
        }
    }

    /// Deterministic sequence, for tests and reproducible dry runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    pub fn capacity() -> usize {
        FIRST_NAMES.len() * LAST_NAMES.len()
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }

    /// Mark a name as taken without issuing it.
    ///
    /// Names this generator could never draw are ignored so they do not
    /// count toward capacity.
    pub fn reserve(&mut self, name: &str) {
        if Self::is_drawable(name) {
            self.issued.insert(name.to_string());
        }
    }

    fn is_drawable(name: &str) -> bool {
        name.split_once('_')
            .is_some_and(|(first, last)| FIRST_NAMES.contains(&first) && LAST_NAMES.contains(&last))
    }

    pub fn next_name(&mut self) -> Result<String> {
        if self.issued.len() >= Self::capacity() {
            return Err(StudyError::PseudonymsExhausted(Self::capacity()));
        }

        for _ in 0..RANDOM_ATTEMPTS {
            let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Alex");
            let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("Adams");
            let name = format!("{first}_{last}");
            if self.issued.insert(name.clone()) {
                return Ok(name);
            }
        }

        // Nearly full: take the first free combination.
        for first in FIRST_NAMES {
            for last in LAST_NAMES {
                let name = format!("{first}_{last}");
                if self.issued.insert(name.clone()) {
                    return Ok(name);
                }
            }
        }
        Err(StudyError::PseudonymsExhausted(Self::capacity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_shape() {
        let mut g = PseudonymGenerator::with_seed(7);
        let name = g.next_name().unwrap();
        let (first, last) = name.split_once('_').unwrap();
        assert!(FIRST_NAMES.contains(&first));
        assert!(LAST_NAMES.contains(&last));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = PseudonymGenerator::with_seed(42);
        let mut b = PseudonymGenerator::with_seed(42);
        for _ in 0..10 {
            assert_eq!(a.next_name().unwrap(), b.next_name().unwrap());
        }
    }

    #[test]
    fn test_never_repeats_until_exhausted() {
        let mut g = PseudonymGenerator::with_seed(1);
        let mut seen = HashSet::new();
        for _ in 0..PseudonymGenerator::capacity() {
            assert!(seen.insert(g.next_name().unwrap()));
        }
        assert_eq!(g.issued(), 676);
        assert!(matches!(
            g.next_name(),
            Err(StudyError::PseudonymsExhausted(676))
        ));
    }

    #[test]
    fn test_reserved_name_not_issued() {
        let mut g = PseudonymGenerator::with_seed(3);
        for first in FIRST_NAMES {
            for last in LAST_NAMES {
                if !(first == "Winter" && last == "Smith") {
                    g.reserve(&format!("{first}_{last}"));
                }
            }
        }
        assert_eq!(g.next_name().unwrap(), "Winter_Smith");
    }

    #[test]
    fn test_reserve_ignores_names_outside_pool() {
        let mut g = PseudonymGenerator::with_seed(9);
        g.reserve("Casey_Nguyen");
        g.reserve("nonsense");
        assert_eq!(g.issued(), 0);

        let mut seen = HashSet::new();
        for _ in 0..PseudonymGenerator::capacity() {
            assert!(seen.insert(g.next_name().unwrap()));
        }
        assert_eq!(seen.len(), 676);
    }

    #[test]
    fn test_reserve_pool_name_reduces_draws() {
        let mut g = PseudonymGenerator::with_seed(9);
        let taken = format!("{}_{}", FIRST_NAMES[0], LAST_NAMES[0]);
        g.reserve(&taken);
        g.reserve(&taken);
        assert_eq!(g.issued(), 1);

        let mut drawn = 0;
        while let Ok(name) = g.next_name() {
            assert_ne!(name, taken);
            drawn += 1;
        }
        assert_eq!(drawn, 675);
    }
}
