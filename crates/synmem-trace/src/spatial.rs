//! Address assignment.
//!
//! The address space is counted in words: `capacity * 2^30 / (system_type / 8)`.
//! Word indices become byte addresses by multiplying with `WORD_BYTES`, which
//! stays at 8 whatever the word width is; traces produced by earlier versions
//! of this tool use that scale and downstream consumers expect it.

use rand::Rng;
use tracing::debug;

use crate::config::ConfigError;
use crate::format::Trace;

/// Word index to byte address scale.
pub const WORD_BYTES: u64 = 8;

const GIB: u64 = 1 << 30;

/// Address generators that actually exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressPattern {
    /// Every access draws an independent word index.
    Random,
    /// Consecutive word indices; on running off the end, restart at a random word.
    Sequential,
}

/// Number of addressable words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddressSpace {
    words: u64,
}

impl AddressSpace {
    /// Space for `capacity_gb` GB of `system_type`-bit words.
    pub fn new(capacity_gb: u64, system_type: u32) -> Result<Self, ConfigError> {
        if capacity_gb == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "capacity",
                reason: "must be at least 1 GB".into(),
            });
        }
        if system_type == 0 || system_type % 8 != 0 {
            return Err(ConfigError::InvalidParameter {
                name: "system_type",
                reason: format!("word width must be a non-zero multiple of 8 bits, got {system_type}"),
            });
        }
        let overflow = ConfigError::AddressSpaceOverflow {
            capacity_gb,
            system_type,
        };
        let words = capacity_gb
            .checked_mul(GIB)
            .ok_or_else(|| overflow.clone())?
            / u64::from(system_type / 8);
        // The highest byte address must still fit.
        words.checked_mul(WORD_BYTES).ok_or(overflow)?;
        Ok(Self { words })
    }

    /// Space with an explicit word count (at least one).
    #[must_use]
    pub fn with_words(words: u64) -> Self {
        Self {
            words: words.max(1),
        }
    }

    /// Number of addressable words.
    #[inline]
    #[must_use]
    pub const fn words(&self) -> u64 {
        self.words
    }

    /// Exclusive upper bound on generated byte addresses.
    #[inline]
    #[must_use]
    pub const fn byte_limit(&self) -> u64 {
        self.words * WORD_BYTES
    }

    fn random_word<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.random_range(0..self.words)
    }
}

/// Assign a byte address to every record in `trace`.
pub fn assign_addresses<R: Rng + ?Sized>(
    trace: &mut Trace,
    space: AddressSpace,
    pattern: AddressPattern,
    rng: &mut R,
) {
    match pattern {
        AddressPattern::Random => {
            for rec in trace.records_mut() {
                rec.address = space.random_word(rng) * WORD_BYTES;
            }
        }
        AddressPattern::Sequential => {
            let mut cursor = space.random_word(rng);
            let mut restarts = 0usize;
            for rec in trace.records_mut() {
                if cursor >= space.words() {
                    cursor = space.random_word(rng);
                    restarts += 1;
                }
                rec.address = cursor * WORD_BYTES;
                cursor += 1;
            }
            debug!(restarts, "sequential walk finished");
        }
    }
}
