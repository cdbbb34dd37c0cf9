// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for search configuration and the static codecs.
//!
//! Nothing inside the backtracking descent returns these: a branch that
//! cannot continue simply fails. Every variant here is raised before the
//! search starts, or by the static codecs.

use thiserror::Error;

/// The error type for all fallible operations in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// An alphabet must hold between 1 and 64 symbols.
    #[error("Alphabet size {0} is outside 1..=64")]
    AlphabetSize(usize),

    /// An alphabet lists the same symbol twice.
    #[error("Alphabet repeats symbol {symbol:?} at index {index}")]
    DuplicateSymbol { symbol: char, index: usize },

    /// Base64 unpacking needs exactly 64 symbols.
    #[error("Base64 needs a 64-symbol alphabet, got {0}")]
    NotBase64(usize),

    /// Input contains a symbol the relevant alphabet does not define.
    #[error("Symbol {symbol:?} at position {position} of the {context} is not in the alphabet")]
    UnknownSymbol {
        context: &'static str,
        symbol: char,
        position: usize,
    },

    /// The ciphertext is too short to search.
    #[error("Ciphertext has {len} symbols, at least {min} required")]
    CiphertextTooShort { len: usize, min: usize },

    /// A Base64 group cannot consist of a single symbol.
    #[error("Ciphertext length {0} leaves a single dangling Base64 symbol")]
    DanglingSymbol(usize),

    /// A key was required but none (or an empty one) was given.
    #[error("Key for {0} must not be empty")]
    EmptyKey(&'static str),

    /// The key buffer bound is zero or larger than the supported maximum.
    #[error("Maximum key length {len} is outside 1..={max}")]
    KeyLength { len: usize, max: usize },

    /// Two alphabets that must describe the same symbol set do not.
    #[error("Alphabet mismatch: {0}")]
    AlphabetMismatch(String),

    /// A crib cannot be applied to the chosen search variant or contradicts itself.
    #[error("Crib rejected: {0}")]
    Crib(String),
}

/// A convenience `Result` type alias using the crate's `SearchError` type.
pub type Result<T> = std::result::Result<T, SearchError>;
