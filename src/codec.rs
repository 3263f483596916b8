//! Positional codec: ordinal position <-> fixed-length candidate password
//!
//! A position is read as an unsigned base-`B` numeral (`B` = alphabet size),
//! most significant digit first. Every length has its own position space
//! starting at 0, so a position is only meaningful together with a length.

use crate::alphabet::Alphabet;
use crate::crypto::{md5_raw, TargetDigest};

/// One hashed candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrackResult {
    /// The candidate password
    pub password: String,
    /// Lowercase hex digest; empty for an end-of-range sentinel
    pub digest: String,
    /// Ordinal position within its length
    pub position: i64,
    /// Whether the digest matched the target
    pub found: bool,
}

impl CrackResult {
    /// Sentinel for a range that ran out without a match
    pub fn exhausted(password: String, position: i64) -> Self {
        Self {
            password,
            digest: String::new(),
            position,
            found: false,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.digest.is_empty()
    }
}

/// Maps positions to candidates for one alphabet
#[derive(Debug, Clone, Default)]
pub struct Keyspace {
    alphabet: Alphabet,
}

impl Keyspace {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Numeral base `B`
    #[inline]
    pub fn base(&self) -> i64 {
        self.alphabet.len() as i64
    }

    /// Number of candidates of `length` symbols, `B^length`.
    ///
    /// Saturates at `i64::MAX` instead of overflowing. A saturated count is
    /// "effectively unbounded", not an exact total.
    pub fn total_combinations(&self, length: usize) -> i64 {
        let base = self.base();
        let mut total: i64 = 1;
        for _ in 0..length {
            total = total.saturating_mul(base);
            if total == i64::MAX {
                break;
            }
        }
        total
    }

    /// Candidate at `position` with exactly `length` symbols.
    ///
    /// Positions at or above `B^length` wrap: digits beyond the width are
    /// dropped. Negative positions map to the first symbol repeated.
    pub fn encode(&self, position: i64, length: usize) -> String {
        let mut buf = vec![0u8; length];
        self.encode_into(position, &mut buf);
        // Alphabet symbols are ASCII
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Allocation-free form of [`encode`](Self::encode); width is `buf.len()`.
    #[inline]
    pub fn encode_into(&self, position: i64, buf: &mut [u8]) {
        if position < 0 {
            buf.fill(self.alphabet.symbol(0));
            return;
        }

        let base = self.base() as u64;
        let mut rest = position as u64;
        for slot in buf.iter_mut().rev() {
            *slot = self.alphabet.symbol((rest % base) as usize);
            rest /= base;
        }
    }

    /// Ordinal of a candidate read as a base-`B` numeral.
    ///
    /// `None` if a symbol is outside the alphabet or the value overflows `i64`.
    pub fn decode(&self, candidate: &str) -> Option<i64> {
        let base = self.base();
        candidate.bytes().try_fold(0i64, |acc, b| {
            let digit = self.alphabet.digit_of(b)? as i64;
            acc.checked_mul(base)?.checked_add(digit)
        })
    }

    /// Encode, hash and compare one position
    pub fn attempt(&self, target: &TargetDigest, position: i64, length: usize) -> CrackResult {
        let password = self.encode(position, length);
        let raw = md5_raw(password.as_bytes());

        CrackResult {
            found: target.matches(&raw),
            digest: hex::encode(raw),
            password,
            position,
        }
    }
}
