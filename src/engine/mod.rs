// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Non-deterministic search engine.
//!
//! This module implements a backtracking search engine that runs predicates
//! in sequence. The engine coordinates with the trail to provide automatic
//! state restoration on backtracking.
//!
//! # Architecture
//!
//! The engine maintains a stack of predicate execution states. Each stack entry tracks:
//! - Which predicate is executing
//! - Current round number (for predicates that execute multiple times)
//! - Choice mode state (whether we're trying alternatives)
//! - Current choice index (when in choice mode)
//!
//! The engine follows a WAM-like execution model:
//! 1. Call try_pred(round) on each predicate
//! 2. If Success: advance to next predicate
//! 3. If SuccessSamePredicate: increment round, stay at same predicate
//! 4. If Choices(n): enter choice mode, call retry_pred(round, 0..n-1)
//! 5. If Failure: backtrack to previous stack entry
//! 6. If Suspend: pause and return control to caller
//!
//! A deterministic success is not retried: backtracking into it undoes its
//! changes and keeps backtracking. When the stack empties, every change made
//! since the search began has been undone.
//!
//! # Example
//!
//! ```
//! use vigenere_search::engine::EngineBuilder;
//! use vigenere_search::predicates::test::{KeySymbolPredicate, SuspendPredicate};
//! use vigenere_search::context::SearchContext;
//!
//! let mut ctx = SearchContext::with_ciphertext(Vec::new(), 4, 2, 0);
//! let engine = EngineBuilder::new()
//!     .add(Box::new(KeySymbolPredicate::new(b"XY")))
//!     .terminal(Box::new(SuspendPredicate))
//!     .build();
//!
//! // Engine is consumed, returns Some(engine) if suspended
//! let engine = engine.search(&mut ctx).unwrap();
//! assert_eq!(ctx.key().as_slice(), b"X");
//!
//! // Resuming backtracks into the next choice
//! let engine = engine.search(&mut ctx).unwrap();
//! assert_eq!(ctx.key().as_slice(), b"Y");
//! assert!(engine.search(&mut ctx).is_none());
//! assert!(ctx.key().is_empty());
//! ```

pub mod predicate;

pub use predicate::{Predicate, PredicateResult, TerminalPredicate};

use crate::context::SearchContext;

/// Initial capacity of the predicate stack.
const STACK_CAPACITY: usize = 1024;

/// Stack entry tracking the state of one predicate execution.
#[derive(Debug)]
struct StackEntry {
    /// Index of the predicate in the predicates list.
    predicate_index: usize,

    /// Current round number (incremented by SuccessSamePredicate).
    round: usize,

    /// Whether we're in choice mode (exploring alternatives).
    in_choice_mode: bool,

    /// Current choice being tried (when in_choice_mode is true).
    current_choice: usize,

    /// Total number of choices (when in_choice_mode is true).
    num_choices: usize,

    /// Trail checkpoint for this stack entry.
    trail_checkpoint: usize,
}

impl StackEntry {
    fn call(predicate_index: usize, round: usize, trail_checkpoint: usize) -> Self {
        Self {
            predicate_index,
            round,
            in_choice_mode: false,
            current_choice: 0,
            num_choices: 0,
            trail_checkpoint,
        }
    }

    /// Leave nothing to retry: the next backtrack into this entry pops it.
    fn retire(&mut self) {
        self.in_choice_mode = true;
        self.current_choice = 0;
        self.num_choices = 0;
    }
}

/// Search engine that coordinates predicate execution and backtracking.
///
/// The engine runs predicates in sequence, managing rounds, choices, and
/// backtracking automatically via the trail.
pub struct SearchEngine<'a> {
    /// List of predicates to execute in sequence.
    predicates: Vec<Box<dyn Predicate + 'a>>,

    /// Stack of predicate execution states. Non-empty only while suspended.
    stack: Vec<StackEntry>,

    /// Trail position when the search began.
    base_checkpoint: usize,

    /// Statistics: number of try_pred calls.
    try_count: u64,

    /// Statistics: number of retry_pred calls (backtracks).
    retry_count: u64,
}

impl<'a> SearchEngine<'a> {
    /// Create a new search engine with the given predicates.
    ///
    /// Prefer [`EngineBuilder`], which checks the program ends with a
    /// terminal predicate.
    pub fn new(predicates: Vec<Box<dyn Predicate + 'a>>) -> Self {
        Self {
            predicates,
            stack: Vec::with_capacity(STACK_CAPACITY),
            base_checkpoint: 0,
            try_count: 0,
            retry_count: 0,
        }
    }

    /// Run the search until it suspends or is exhausted.
    ///
    /// Consumes the engine and returns:
    /// - `Some(engine)` if suspended - calling search() again resumes by
    ///   backtracking out of the suspension point
    /// - `None` if exhausted - `ctx` is back at its state from before the search
    ///
    /// # Panics
    ///
    /// Panics if the predicate sequence is invalid (reaches the end without FAIL or SUSPEND),
    /// or if retry_pred returns Choices or Suspend.
    pub fn search(mut self, ctx: &mut SearchContext) -> Option<Self> {
        if self.predicates.is_empty() {
            return None; // Empty is exhausted
        }

        if self.stack.is_empty() {
            self.try_count = 0;
            self.retry_count = 0;
            self.base_checkpoint = ctx.trail.checkpoint();
            self.stack
                .push(StackEntry::call(0, 0, self.base_checkpoint));
        } else if let Some(suspended) = self.stack.last_mut() {
            suspended.retire();
        }

        // Main execution loop
        loop {
            let Some(entry) = self.stack.last_mut() else {
                // Backtracked past the first predicate
                ctx.rewind_to(self.base_checkpoint);
                return None;
            };

            // Rewind trail to this entry's checkpoint
            ctx.rewind_to(entry.trail_checkpoint);

            let pred_idx = entry.predicate_index;
            let round = entry.round;

            if !entry.in_choice_mode {
                // Call mode: try_pred
                self.try_count += 1;
                let result = self.predicates[pred_idx].try_pred(ctx, round);

                match result {
                    PredicateResult::Success => {
                        self.retire_top();
                        self.push_next_predicate(ctx);
                    }
                    PredicateResult::SuccessSamePredicate => {
                        self.retire_top();
                        self.push_same_predicate(ctx);
                    }
                    PredicateResult::Failure => {
                        self.stack.pop();
                    }
                    PredicateResult::Choices(n) => {
                        if let Some(entry) = self.stack.last_mut() {
                            entry.in_choice_mode = true;
                            entry.current_choice = 0;
                            entry.num_choices = n;
                            entry.trail_checkpoint = ctx.trail.checkpoint();
                        }
                    }
                    PredicateResult::Suspend => {
                        return Some(self);
                    }
                }
            } else {
                // Choice mode: retry_pred
                if entry.current_choice >= entry.num_choices {
                    self.stack.pop();
                    continue;
                }

                let choice = entry.current_choice;
                entry.current_choice += 1;
                self.retry_count += 1;
                let result = self.predicates[pred_idx].retry_pred(ctx, round, choice);

                match result {
                    PredicateResult::Success => self.push_next_predicate(ctx),
                    PredicateResult::SuccessSamePredicate => self.push_same_predicate(ctx),
                    PredicateResult::Failure => {
                        // Try next choice (loop continues)
                    }
                    PredicateResult::Choices(_) | PredicateResult::Suspend => {
                        panic!(
                            "{}::retry_pred returned invalid result: {:?}",
                            self.predicates[pred_idx].name(),
                            result
                        );
                    }
                }
            }
        }
    }

    fn retire_top(&mut self) {
        if let Some(entry) = self.stack.last_mut() {
            entry.retire();
        }
    }

    fn top(&self) -> &StackEntry {
        match self.stack.last() {
            Some(entry) => entry,
            None => panic!("Engine stack is empty"),
        }
    }

    /// Push a new stack entry for the next predicate in sequence.
    ///
    /// Panics if we've reached the end of the predicate sequence, as this indicates
    /// an invalid program (all valid programs must end with FAIL or SUSPEND).
    fn push_next_predicate(&mut self, ctx: &SearchContext) {
        let next_index = self.top().predicate_index + 1;

        if next_index >= self.predicates.len() {
            panic!(
                "Invalid predicate sequence: reached end without FAIL or SUSPEND. \
                 All programs must terminate with a FAIL or SUSPEND predicate."
            );
        }

        self.stack
            .push(StackEntry::call(next_index, 0, ctx.trail.checkpoint()));
    }

    /// Push a new stack entry for the same predicate with incremented round.
    fn push_same_predicate(&mut self, ctx: &SearchContext) {
        let current = self.top();
        let entry = StackEntry::call(
            current.predicate_index,
            current.round + 1,
            ctx.trail.checkpoint(),
        );
        self.stack.push(entry);
    }

    /// Get statistics about the search.
    ///
    /// Returns (try_count, retry_count) showing how many times predicates
    /// were tried and retried.
    pub fn statistics(&self) -> (u64, u64) {
        (self.try_count, self.retry_count)
    }
}

impl std::fmt::Debug for SearchEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("predicates", &self.predicates)
            .field("depth", &self.stack.len())
            .finish()
    }
}

/// Builds a program: any number of predicates, then exactly one terminal.
#[derive(Default)]
pub struct EngineBuilder<'a> {
    predicates: Vec<Box<dyn Predicate + 'a>>,
}

/// A program whose last predicate is terminal.
pub struct TerminatedBuilder<'a> {
    predicates: Vec<Box<dyn Predicate + 'a>>,
}

impl<'a> EngineBuilder<'a> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Append a predicate.
    pub fn add(mut self, predicate: Box<dyn Predicate + 'a>) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Append the terminal predicate, closing the program.
    pub fn terminal<T: TerminalPredicate + 'a>(mut self, predicate: Box<T>) -> TerminatedBuilder<'a> {
        self.predicates.push(predicate);
        TerminatedBuilder {
            predicates: self.predicates,
        }
    }
}

impl<'a> TerminatedBuilder<'a> {
    pub fn build(self) -> SearchEngine<'a> {
        SearchEngine::new(self.predicates)
    }
}
