// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Backtracking cryptanalysis of Vigenère ciphertext under Base64 encoding.
//!
//! Given ciphertext produced by a Vigenère (or plain substitution) layer
//! over a 64-symbol alphabet, followed by Base64 unpacking, the search
//! recovers an unknown alphabet and/or key such that every decoded byte is
//! plausible, typically printable ASCII.
//!
//! # Architecture
//!
//! The implementation uses a two-tier memory model:
//!
//! ## Tier 1: Plan (Immutable)
//!
//! Fixed when a [`SearchConfig`] is prepared:
//! - The ciphertext, with padding stripped
//! - The [`Resolver`](variants::Resolver) for the chosen [`Unknown`]
//! - The plausibility test compiled into a byte lookup table
//! - Per-position constraints from plaintext cribs
//!
//! ## Tier 2: Context (Mutable)
//!
//! Search state that changes during search, tracked on the trail:
//! - Trail - records state changes for O(1) backtracking
//! - Assignment - the partial alphabet bijection
//! - Key buffer, cursor and partial output
//!
//! # Search Algorithm
//!
//! The program run by the engine is:
//!
//! 1. **DecodePredicate**: resolve each ciphertext symbol, branching where
//!    the alphabet or key is not yet known, and unpack it into output bits,
//!    pruning as soon as a byte cannot become plausible
//! 2. **Count**: count the solution
//! 3. **ReportPredicate**: hand the solution to the caller
//! 4. **FailPredicate**: backtrack for the next one
//!
//! # Parallelization
//!
//! [`PreparedSearch::run_parallel`] splits the first branch point across
//! worker threads, each with a private context.
//!
//! # Example
//!
//! ```
//! use vigenere_search::heuristic::AcceptAll;
//! use vigenere_search::{Alphabet, OutputLayout, SearchConfig, Unknown};
//!
//! // Two distinct ciphertext symbols over a 4-symbol alphabet
//! // decode to 4 * 3 ordered pairs of distinct symbols.
//! let search = SearchConfig::new("AB", Unknown::SubstitutionAlphabet)
//!     .with_alphabet(Alphabet::new(b"ABCD").unwrap())
//!     .with_layout(OutputLayout::Direct)
//!     .with_plausibility(AcceptAll)
//!     .prepare()
//!     .unwrap();
//! let report = search.collect();
//! assert_eq!(report.solutions.len(), 12);
//! assert!(report.exhausted);
//! ```

pub mod alphabet;
pub mod codec;
pub mod context;
pub mod engine;
pub mod error;
pub mod heuristic;
pub mod predicates;
pub mod state;
pub mod trail;
pub mod variants;

// Re-export commonly used types
pub use alphabet::Alphabet;
pub use context::SearchContext;
pub use engine::{Predicate, PredicateResult, SearchEngine};
pub use error::{Result, SearchError};
pub use predicates::Solution;
pub use trail::Trail;
pub use variants::{
    Crib, LayerOrder, OutputLayout, PreparedSearch, SearchConfig, SearchReport, Unknown,
};
