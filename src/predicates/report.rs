// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Solution capture.
//!
//! The report predicate runs once per completed decode. It copies the
//! assignment, key and plaintext out of the context into a [`Solution`] and
//! hands it to the caller, whose answer decides whether the search goes on.

use std::ops::ControlFlow;

use log::trace;

use crate::context::SearchContext;
use crate::engine::{Predicate, PredicateResult};
use crate::heuristic::shannon_entropy;

/// One decoding that passed every plausibility check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Solution {
    pub plaintext: Vec<u8>,
    /// Slot to symbol, for searches over an alphabet. Slots the
    /// ciphertext never reached are `None`.
    pub alphabet: Option<Vec<Option<u8>>>,
    /// The recovered key, for key searches.
    pub key: Option<Vec<u8>>,
}

impl Solution {
    /// The alphabet with `placeholder` for unreached slots.
    pub fn alphabet_string(&self, placeholder: char) -> Option<String> {
        self.alphabet.as_ref().map(|slots| {
            slots
                .iter()
                .map(|s| s.map_or(placeholder, char::from))
                .collect()
        })
    }

    pub fn key_string(&self) -> Option<String> {
        self.key.as_ref().map(|k| String::from_utf8_lossy(k).into_owned())
    }

    pub fn plaintext_lossy(&self) -> String {
        String::from_utf8_lossy(&self.plaintext).into_owned()
    }

    /// Entropy of the plaintext in bits per byte; lower reads more like text.
    pub fn entropy(&self) -> f64 {
        shannon_entropy(&self.plaintext)
    }
}

/// Hands each solution to a callback. `Break` suspends the engine.
pub struct ReportPredicate<'a> {
    on_solution: &'a mut dyn FnMut(&Solution) -> ControlFlow<()>,
    report_alphabet: bool,
    report_key: bool,
}

impl<'a> ReportPredicate<'a> {
    pub fn new(
        on_solution: &'a mut dyn FnMut(&Solution) -> ControlFlow<()>,
        report_alphabet: bool,
        report_key: bool,
    ) -> Self {
        Self {
            on_solution,
            report_alphabet,
            report_key,
        }
    }

    fn capture(&self, ctx: &SearchContext) -> Solution {
        Solution {
            plaintext: ctx.plaintext().to_vec(),
            alphabet: self
                .report_alphabet
                .then(|| ctx.assignment().slots().to_vec()),
            key: self.report_key.then(|| ctx.key().as_slice().to_vec()),
        }
    }
}

impl std::fmt::Debug for ReportPredicate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportPredicate")
            .field("report_alphabet", &self.report_alphabet)
            .field("report_key", &self.report_key)
            .finish()
    }
}

impl Predicate for ReportPredicate<'_> {
    fn try_pred(&mut self, ctx: &mut SearchContext, _round: usize) -> PredicateResult {
        let solution = self.capture(ctx);
        trace!(
            "Solution: {:?} alphabet={:?} key={:?}",
            solution.plaintext_lossy(),
            solution.alphabet_string('_'),
            solution.key_string()
        );
        match (self.on_solution)(&solution) {
            ControlFlow::Continue(()) => PredicateResult::Success,
            ControlFlow::Break(()) => PredicateResult::Suspend,
        }
    }

    fn name(&self) -> &str {
        "Report"
    }
}
