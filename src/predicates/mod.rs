// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search predicates.
//!
//! A search program is a sequence of predicates run by the engine:
//!
//! ```text
//! Decode -> Count(Solutions) -> Report -> Fail
//! ```
//!
//! # Organization
//!
//! - `decode`: [`DecodePredicate`], which resolves and decodes the ciphertext
//! - `report`: [`ReportPredicate`], which hands solutions to the caller
//! - `test`: Simple test predicates for validating the engine
//! - Built-in predicate: `FailPredicate`

pub mod decode;
pub mod report;

pub use decode::{DecodePlan, DecodePredicate, Partition, Progress, SymbolConstraint};
pub use report::{ReportPredicate, Solution};

use crate::context::SearchContext;
use crate::engine::{Predicate, PredicateResult, TerminalPredicate};

/// Built-in fail predicate (Prolog's `fail.`).
///
/// Ending a program with `FailPredicate` makes the engine backtrack into
/// every remaining alternative after each solution.
///
/// # Example
///
/// ```
/// use vigenere_search::engine::EngineBuilder;
/// use vigenere_search::predicates::FailPredicate;
/// use vigenere_search::predicates::test::KeySymbolPredicate;
/// use vigenere_search::context::SearchContext;
///
/// let mut ctx = SearchContext::with_ciphertext(Vec::new(), 4, 1, 0);
/// let engine = EngineBuilder::new()
///     .add(Box::new(KeySymbolPredicate::new(b"ABC")))
///     .terminal(Box::new(FailPredicate))
///     .build();
///
/// // Engine will exhaust all key choices then fail
/// let result = engine.search(&mut ctx);
/// assert!(result.is_none()); // Failed - engine consumed
/// assert!(ctx.key().is_empty());
/// ```
#[derive(Debug)]
pub struct FailPredicate;

impl Predicate for FailPredicate {
    fn try_pred(&mut self, _ctx: &mut SearchContext, _round: usize) -> PredicateResult {
        PredicateResult::Failure
    }

    fn retry_pred(
        &mut self,
        _ctx: &mut SearchContext,
        _round: usize,
        _choice: usize,
    ) -> PredicateResult {
        PredicateResult::Failure
    }

    fn name(&self) -> &str {
        "Fail"
    }
}

/// FailPredicate is a terminal predicate (like Prolog's fail.).
impl TerminalPredicate for FailPredicate {}
