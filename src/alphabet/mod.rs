// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Ordered, duplicate-free symbol alphabets.
//!
//! An [`Alphabet`] fixes both the enumeration order of a search and the index
//! each symbol takes in Vigenère arithmetic. Lookups in both directions are
//! table driven: 256 reverse entries make `index_of` a single load.

use std::fmt;

use crate::error::{Result, SearchError};

/// Largest alphabet supported. Free slots are tracked in a `u64` mask.
pub const MAX_ALPHABET_SIZE: usize = 64;

/// The standard Base64 alphabet `A-Za-z0-9+/`.
pub const BASE64_STANDARD: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Upper-case Latin letters, the classic Vigenère alphabet.
pub const LATIN_UPPER: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// An ordered sequence of distinct byte symbols.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    index: [Option<u8>; 256],
}

impl Alphabet {
    /// Build an alphabet, rejecting duplicates and sizes outside `1..=64`.
    pub fn new(symbols: &[u8]) -> Result<Self> {
        if symbols.is_empty() || symbols.len() > MAX_ALPHABET_SIZE {
            return Err(SearchError::AlphabetSize(symbols.len()));
        }
        let mut index = [None; 256];
        for (i, &symbol) in symbols.iter().enumerate() {
            if index[symbol as usize].is_some() {
                return Err(SearchError::DuplicateSymbol {
                    symbol: symbol as char,
                    index: i,
                });
            }
            index[symbol as usize] = Some(i as u8);
        }
        Ok(Self {
            symbols: symbols.to_vec(),
            index,
        })
    }

    /// The standard Base64 alphabet.
    pub fn base64() -> Self {
        Self::from_constant(BASE64_STANDARD)
    }

    /// The 26 upper-case Latin letters.
    pub fn latin_upper() -> Self {
        Self::from_constant(LATIN_UPPER)
    }

    /// Build from a constant already known to be duplicate free.
    fn from_constant(symbols: &[u8]) -> Self {
        let mut index = [None; 256];
        for (i, &symbol) in symbols.iter().enumerate() {
            index[symbol as usize] = Some(i as u8);
        }
        Self {
            symbols: symbols.to_vec(),
            index,
        }
    }

    /// Number of symbols (the Vigenère modulus `N`).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Alphabets are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Modulus as the narrow integer type used by the codec primitives.
    pub fn modulus(&self) -> u8 {
        self.symbols.len() as u8
    }

    /// Index of `symbol`, or `None` when it is not a member.
    #[inline]
    pub fn index_of(&self, symbol: u8) -> Option<u8> {
        self.index[symbol as usize]
    }

    /// Symbol at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn symbol(&self, index: u8) -> u8 {
        self.symbols[index as usize]
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.index_of(symbol).is_some()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }

    /// True when both alphabets hold the same symbols, in any order.
    pub fn same_symbols(&self, other: &Alphabet) -> bool {
        self.len() == other.len() && self.symbols.iter().all(|&s| other.contains(s))
    }

    /// Position of the first byte of `text` outside this alphabet.
    pub fn first_foreign(&self, text: &[u8]) -> Option<(usize, u8)> {
        text.iter()
            .copied()
            .enumerate()
            .find(|&(_, symbol)| !self.contains(symbol))
    }

    /// Check every byte of `text` is a member, naming `context` in the error.
    pub fn check_members(&self, text: &[u8], context: &'static str) -> Result<()> {
        match self.first_foreign(text) {
            Some((position, symbol)) => Err(SearchError::UnknownSymbol {
                context,
                symbol: symbol as char,
                position,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alphabet({:?})", String::from_utf8_lossy(&self.symbols))
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.symbols))
    }
}
