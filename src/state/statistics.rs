// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Statistics are stored in the context, and can be incremented by special predicates,
//! or directly by the decode driver.

use crate::context::SearchContext;
use crate::engine::{Predicate, PredicateResult};
use strum::EnumCount;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter, IntoStaticStr};

#[derive(EnumCountMacro, EnumIter, IntoStaticStr, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    /// Iterations of the decode driver loop.
    Steps,
    /// Points where the driver returned a list of choices.
    BranchPoints,
    /// Branches cut by the plausibility test, a crib, or an empty choice list.
    Prunes,
    Solutions,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    stats: [u64; Counters::COUNT],
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    /// A predicate that will increment the given counter, whenever a condition holds (or always).
    pub fn counting_predicate<'a>(
        counter: Counters,
        filter: Option<fn(&SearchContext) -> bool>,
    ) -> Box<dyn Predicate + 'a> {
        Box::new(CountingPredicate {
            filter: filter.unwrap_or(|_ctxt| true),
            counter,
        })
    }

    /// Increment the specified counter by 1.
    pub fn increment(&mut self, counter: Counters) {
        self.stats[counter as usize] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize]
    }

    /// Counter values accumulated since `earlier`.
    pub fn since(&self, earlier: &Statistics) -> Statistics {
        let mut delta = Statistics::new();
        for (i, (now, then)) in self.stats.iter().zip(&earlier.stats).enumerate() {
            delta.stats[i] = now - then;
        }
        delta
    }

    /// Add another set of counters into this one.
    pub fn absorb(&mut self, other: &Statistics) {
        for (mine, theirs) in self.stats.iter_mut().zip(&other.stats) {
            *mine += theirs;
        }
    }
}

struct CountingPredicate {
    filter: fn(&SearchContext) -> bool,
    counter: Counters,
}

impl std::fmt::Debug for CountingPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.counter.into();
        write!(f, "Count({name})")
    }
}

impl Predicate for CountingPredicate {
    fn try_pred(&mut self, ctx: &mut SearchContext, _round: usize) -> PredicateResult {
        if (self.filter)(ctx) {
            ctx.statistics.increment(self.counter);
        }
        PredicateResult::Success
    }

    fn name(&self) -> &str {
        "Count"
    }
}
