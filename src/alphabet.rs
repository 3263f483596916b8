//! Candidate alphabets
//!
//! An [`Alphabet`] is the ordered digit set of the numeral system the codec
//! enumerates in. Symbol order is part of the enumeration order, so changing
//! it changes which password sits at which position.

use crate::error::{ConfigError, Result};
use std::fmt;

/// The default 95-symbol alphabet: lowercase, uppercase, digits, punctuation, space.
pub const FULL_SYMBOLS: &str = concat!(
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "0123456789",
    "!@#$%^&*()-_+=[]{}|\\:;\"'<>,.?/`~ ",
);

/// Lowercase ASCII letters only
pub const LOWERCASE_SYMBOLS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Letters followed by digits
pub const ALPHANUMERIC_SYMBOLS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Decimal digits
pub const DIGIT_SYMBOLS: &str = "0123456789";

/// Ordered, duplicate-free set of single-byte symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Box<[u8]>,
    /// Reverse lookup: byte -> digit value
    digits: [Option<u8>; 128],
}

impl Alphabet {
    /// Build an alphabet from a symbol string.
    ///
    /// Every symbol must be printable ASCII (space included) and appear once.
    pub fn new(symbols: &str) -> Result<Self> {
        if symbols.is_empty() {
            return Err(ConfigError::EmptyAlphabet.into());
        }

        let mut digits = [None; 128];
        let mut bytes = Vec::with_capacity(symbols.len());

        for c in symbols.chars() {
            if !(c.is_ascii_graphic() || c == ' ') {
                return Err(ConfigError::NonAsciiSymbol(c).into());
            }
            let b = c as u8;
            if digits[b as usize].is_some() {
                return Err(ConfigError::DuplicateSymbol(c).into());
            }
            digits[b as usize] = Some(bytes.len() as u8);
            bytes.push(b);
        }

        Ok(Self {
            symbols: bytes.into_boxed_slice(),
            digits,
        })
    }

    /// The 95-symbol default alphabet
    pub fn full() -> Self {
        Self::from_static(FULL_SYMBOLS)
    }

    /// Lowercase letters (`B = 26`)
    pub fn lowercase() -> Self {
        Self::from_static(LOWERCASE_SYMBOLS)
    }

    /// Resolve a named preset: `full`, `lowercase`, `alphanumeric` or `digits`
    pub fn preset(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "full" | "default" => Ok(Self::full()),
            "lowercase" | "lower" => Ok(Self::lowercase()),
            "alphanumeric" | "alnum" => Ok(Self::from_static(ALPHANUMERIC_SYMBOLS)),
            "digits" => Ok(Self::from_static(DIGIT_SYMBOLS)),
            other => Err(ConfigError::UnknownPreset(other.to_string()).into()),
        }
    }

    fn from_static(symbols: &'static str) -> Self {
        match Self::new(symbols) {
            Ok(alphabet) => alphabet,
            Err(e) => unreachable!("built-in alphabet {symbols:?} is invalid: {e}"),
        }
    }

    /// Numeral base `B`
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbol byte for a digit value
    #[inline]
    pub fn symbol(&self, digit: usize) -> u8 {
        self.symbols[digit]
    }

    /// Digit value of a symbol byte, if it belongs to the alphabet
    #[inline]
    pub fn digit_of(&self, symbol: u8) -> Option<u8> {
        self.digits.get(symbol as usize).copied().flatten()
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.digit_of(symbol).is_some()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::full()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Symbols are validated ASCII
        f.write_str(&String::from_utf8_lossy(&self.symbols))
    }
}
