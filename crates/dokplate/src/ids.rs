//! Collision-checked identifier generation
//!
//! Ids are a fixed prefix plus a random number drawn from a configured range.
//! A candidate is rejected while the target buffer already contains it, up
//! to a bounded number of attempts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::IdRange;
use crate::error::{Result, TemplateError};

/// Random id source bound to one processor
#[derive(Debug)]
pub struct IdGenerator<R = StdRng> {
    rng: R,
    max_attempts: u32,
}

impl IdGenerator<StdRng> {
    /// Generator seeded from the operating system
    pub fn from_os_rng(max_attempts: u32) -> Self {
        Self::new(StdRng::from_os_rng(), max_attempts)
    }
}

impl<R: Rng> IdGenerator<R> {
    pub fn new(rng: R, max_attempts: u32) -> Self {
        Self { rng, max_attempts }
    }

    /// Generate an id from `range` that does not occur in `haystack`
    pub fn generate(&mut self, range: &IdRange, haystack: &str) -> Result<String> {
        for attempt in 1..=self.max_attempts {
            let id = format!(
                "{}{}",
                range.prefix,
                self.rng.random_range(range.min..=range.max)
            );
            if !haystack.contains(&id) {
                debug!(id = %id, attempt, "generated identifier");
                return Ok(id);
            }
            warn!(id = %id, attempt, "identifier collides with existing content, retrying");
        }

        Err(TemplateError::IdentifiersExhausted {
            prefix: range.prefix.clone(),
            attempts: self.max_attempts,
        })
    }
}
