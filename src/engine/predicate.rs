// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Predicate trait for non-deterministic search.
//!
//! The search engine works by trying predicates in sequence. Each predicate
//! represents a choice point in the search space. Predicates can succeed,
//! fail, offer choices, or suspend the search.
//!
//! # Example
//!
//! ```
//! use vigenere_search::engine::{Predicate, PredicateResult};
//! use vigenere_search::context::SearchContext;
//!
//! #[derive(Debug)]
//! struct TwoKeys;
//!
//! impl Predicate for TwoKeys {
//!     fn try_pred(&mut self, _ctx: &mut SearchContext, _round: usize) -> PredicateResult {
//!         PredicateResult::Choices(2)
//!     }
//!
//!     fn retry_pred(&mut self, ctx: &mut SearchContext, _round: usize, choice: usize) -> PredicateResult {
//!         ctx.push_key(b"AB"[choice]);
//!         PredicateResult::Success
//!     }
//!
//!     fn name(&self) -> &str {
//!         "TwoKeys"
//!     }
//! }
//! ```

use crate::context::SearchContext;
use std::fmt::Debug;

/// Result of attempting a predicate.
///
/// Predicates can return:
/// - `Success`: Move to next predicate in the sequence
/// - `SuccessSamePredicate`: Stay at same predicate, increment round (for iterative predicates)
/// - `Failure`: Backtrack to previous predicate
/// - `Choices(n)`: Predicate has n choices to explore via retry_pred
/// - `Suspend`: Pause execution and return control to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateResult {
    /// Predicate succeeded. Move to next predicate in sequence.
    Success,

    /// Predicate succeeded but stay at same predicate with next round.
    /// The decode driver uses one round per resolved choice.
    SuccessSamePredicate,

    /// Predicate has no (more) valid choices. Backtrack to previous predicate.
    Failure,

    /// Predicate has multiple choices to explore.
    /// Engine will call retry_pred(round, choice) for each choice in 0..n.
    Choices(usize),

    /// Suspend execution. Engine returns control with state preserved.
    Suspend,
}

/// A terminal predicate that ends a program.
///
/// Terminal predicates are FAIL or SUSPEND - they never return Success.
/// `EngineBuilder::terminal` only accepts these, so every program ends properly.
pub trait TerminalPredicate: Predicate {}

/// Trait for search predicates in the non-deterministic engine.
///
/// # Lifecycle
///
/// 1. Engine calls `try_pred` when first encountering the predicate
/// 2. If Success: engine advances to next predicate
/// 3. If Failure: engine backtracks to previous predicate
/// 4. If Choices(n): engine calls `retry_pred` for choices `0..n`, one per backtrack
///
/// # Trail Integration
///
/// Predicates change `SearchContext` state only through its trailed mutators.
/// The engine rewinds the trail to the entry's checkpoint before every
/// retry and when the entry is abandoned.
pub trait Predicate: Debug {
    /// Try this predicate for a given round.
    ///
    /// The round starts at 0 and increments each time the predicate returns
    /// `SuccessSamePredicate`.
    fn try_pred(&mut self, ctx: &mut SearchContext, round: usize) -> PredicateResult;

    /// Retry this predicate with a specific choice.
    ///
    /// Called after try_pred returns Choices(n), for each choice in 0..n.
    /// The trail has already been rewound to the state right after `try_pred`.
    ///
    /// Note: retry_pred cannot return Choices or Suspend (we're already in choice mode).
    #[allow(unused)]
    fn retry_pred(
        &mut self,
        ctx: &mut SearchContext,
        round: usize,
        choice: usize,
    ) -> PredicateResult {
        // Predicates that return Choices must implement this.
        panic!("{}::retry_pred should never be called", self.name());
    }

    /// Name for logging and debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
