//! core::ids
//!
//! Layer id generation.
//!
//! # Strategies
//!
//! - **Short** (default): 7 random characters from `[0-9A-Za-z]`. Every
//!   candidate is checked against the ids already present in the tree and
//!   regenerated on collision, so uniqueness holds by construction rather
//!   than by probability.
//! - **Uuid**: random (v4) UUIDs in hyphenated form. The id space is large
//!   enough that the collision check never fires in practice, but it still
//!   runs.
//!
//! # Determinism
//!
//! Generators own their random source. [`IdGenerator::seeded`] makes id
//! sequences reproducible, which the test suites rely on.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::LayerId;

/// Alphabet used for short ids.
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Default length of short ids.
pub const DEFAULT_ID_LENGTH: usize = 7;

/// Collisions tolerated at one length before the candidate grows by a character.
const MAX_ATTEMPTS_PER_LENGTH: usize = 32;

/// How new layer ids are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Short alphanumeric ids of the given length.
    Short { length: usize },
    /// Hyphenated v4 UUIDs.
    Uuid,
}

impl Default for IdStrategy {
    fn default() -> Self {
        IdStrategy::Short {
            length: DEFAULT_ID_LENGTH,
        }
    }
}

/// Produces fresh [`LayerId`]s.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    strategy: IdStrategy,
    rng: StdRng,
}

impl IdGenerator {
    /// Create a generator seeded from the operating system.
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a generator with a fixed seed.
    pub fn seeded(strategy: IdStrategy, seed: u64) -> Self {
        Self {
            strategy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The strategy this generator uses.
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Generate an id not contained in `taken`, and record it there.
    ///
    /// Callers pass the id set of the live tree (plus anything already
    /// allocated in the same operation), so two ids handed out against the
    /// same set never coincide.
    pub fn fresh(&mut self, taken: &mut HashSet<LayerId>) -> LayerId {
        let mut length = match self.strategy {
            IdStrategy::Short { length } => length.max(1),
            IdStrategy::Uuid => 0,
        };
        let mut attempts = 0;

        loop {
            let candidate = match self.strategy {
                IdStrategy::Short { .. } => self.short(length),
                IdStrategy::Uuid => self.uuid(),
            };
            if taken.insert(candidate.clone()) {
                return candidate;
            }

            tracing::trace!(id = %candidate, "layer id collision, retrying");
            attempts += 1;
            if attempts % MAX_ATTEMPTS_PER_LENGTH == 0 {
                length += 1;
            }
        }
    }

    fn short(&mut self, length: usize) -> LayerId {
        let id: String = (0..length)
            .map(|_| ALPHABET[self.rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        LayerId::from_generated(id)
    }

    fn uuid(&mut self) -> LayerId {
        let bytes: [u8; 16] = self.rng.random();
        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        LayerId::from_generated(uuid.hyphenated().to_string())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}
