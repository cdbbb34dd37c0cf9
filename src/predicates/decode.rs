// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The decode driver.
//!
//! One predicate walks the whole ciphertext. Each round continues from the
//! cursor, resolving stages and emitting output until the next branch point,
//! where it returns `Choices(n)`. `retry_pred` applies one choice and hands
//! over to the next round, which re-evaluates the same stage.
//!
//! Base64 output is built a sextet at a time:
//!
//! | Sextet | Completes | Starts | Check |
//! |---|---|---|---|
//! | +0 | | byte 0, top 6 bits | some completion of byte 0 is plausible |
//! | +1 | byte 0 | byte 1, top 4 bits | byte 0 plausible, byte 1 completable |
//! | +2 | byte 1 | byte 2, top 2 bits | byte 1 plausible, byte 2 completable |
//! | +3 | byte 2 | | byte 2 plausible, the 3-byte run plausible |
//!
//! A short final group of two or three sextets yields one or two bytes, and
//! its unused low bits must be zero.

use std::sync::Arc;

use log::debug;

use crate::alphabet::Alphabet;
use crate::context::SearchContext;
use crate::engine::{Predicate, PredicateResult};
use crate::heuristic::{ByteClass, Plausibility};
use crate::state::{Counters, Cursor};
use crate::variants::{Choice, OutputLayout, Resolver, Step};

/// Required bits of one decoded symbol: `symbol_value & mask == value`.
///
/// The value is a sextet in the Base64 layout and a byte in the direct layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolConstraint {
    pub value: u8,
    pub mask: u8,
}

impl SymbolConstraint {
    pub fn admits(&self, value: u8) -> bool {
        value & self.mask == self.value
    }
}

/// Everything the driver needs that stays fixed for a search.
#[derive(Debug, Clone)]
pub struct DecodePlan {
    pub resolver: Resolver,
    pub layout: OutputLayout,
    /// Maps decoded symbols to sextets in the Base64 layout.
    pub encoding: Alphabet,
    pub class: ByteClass,
    pub plausibility: Arc<dyn Plausibility>,
    /// Constraints for the first ciphertext positions, from plaintext cribs.
    pub constraints: Vec<SymbolConstraint>,
}

/// This worker takes the choices `c` with `c % workers == worker` at the
/// first branch point, and every choice after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub worker: usize,
    pub workers: usize,
}

/// Called with the context every `interval` driver steps.
pub struct Progress<'a> {
    pub interval: u64,
    pub callback: &'a mut dyn FnMut(&SearchContext),
}

/// Resolves and decodes the ciphertext one symbol at a time.
pub struct DecodePredicate<'a> {
    plan: &'a DecodePlan,
    /// Choices offered at each round.
    choices: Vec<Vec<Choice>>,
    partition: Option<Partition>,
    split_round: Option<usize>,
    progress: Option<Progress<'a>>,
}

impl<'a> DecodePredicate<'a> {
    pub fn new(plan: &'a DecodePlan) -> Self {
        Self {
            plan,
            choices: Vec::new(),
            partition: None,
            split_round: None,
            progress: None,
        }
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_progress(mut self, progress: Progress<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn tick(&mut self, ctx: &mut SearchContext) {
        ctx.statistics.increment(Counters::Steps);
        if let Some(progress) = &mut self.progress {
            let steps = ctx.statistics.get(Counters::Steps);
            if steps % progress.interval.max(1) == 0 {
                (progress.callback)(ctx);
            }
        }
    }

    fn prune(ctx: &mut SearchContext) -> PredicateResult {
        ctx.statistics.increment(Counters::Prunes);
        PredicateResult::Failure
    }

    /// Write the output for `symbol` at `cursor` and advance past it.
    ///
    /// Returns false, leaving partial writes for the trail to undo, when
    /// the output cannot be plausible.
    fn emit(&self, ctx: &mut SearchContext, cursor: Cursor, symbol: u8) -> bool {
        let pos = cursor.ciphertext_index;
        let constraint = self.plan.constraints.get(pos);
        let class = &self.plan.class;

        let produced = match self.plan.layout {
            OutputLayout::Direct => {
                if constraint.is_some_and(|c| !c.admits(symbol)) || !class.accepts(symbol) {
                    return false;
                }
                ctx.write_output(cursor.plaintext_index, symbol);
                if !self
                    .plan
                    .plausibility
                    .accepts_run(&ctx.output()[cursor.plaintext_index..=cursor.plaintext_index])
                {
                    return false;
                }
                1
            }
            OutputLayout::Base64 => {
                let Some(v) = self.plan.encoding.index_of(symbol) else {
                    return false;
                };
                if constraint.is_some_and(|c| !c.admits(v)) {
                    return false;
                }
                let base = cursor.plaintext_index;
                let last = pos + 1 == ctx.ciphertext().len();
                match pos % 4 {
                    0 => {
                        let b0 = v << 2;
                        if !class.admits_prefix(b0, 6) {
                            return false;
                        }
                        ctx.write_output(base, b0);
                        0
                    }
                    1 => {
                        let b0 = ctx.output()[base] | (v >> 4);
                        if !class.accepts(b0) {
                            return false;
                        }
                        ctx.write_output(base, b0);
                        if last {
                            if v & 0x0f != 0 || !self.run_ok(ctx, base, 1) {
                                return false;
                            }
                            1
                        } else {
                            let b1 = (v & 0x0f) << 4;
                            if !class.admits_prefix(b1, 4) {
                                return false;
                            }
                            ctx.write_output(base + 1, b1);
                            0
                        }
                    }
                    2 => {
                        let b1 = ctx.output()[base + 1] | (v >> 2);
                        if !class.accepts(b1) {
                            return false;
                        }
                        ctx.write_output(base + 1, b1);
                        if last {
                            if v & 0x03 != 0 || !self.run_ok(ctx, base, 2) {
                                return false;
                            }
                            2
                        } else {
                            let b2 = (v & 0x03) << 6;
                            if !class.admits_prefix(b2, 2) {
                                return false;
                            }
                            ctx.write_output(base + 2, b2);
                            0
                        }
                    }
                    _ => {
                        let b2 = ctx.output()[base + 2] | v;
                        if !class.accepts(b2) {
                            return false;
                        }
                        ctx.write_output(base + 2, b2);
                        if !self.run_ok(ctx, base, 3) {
                            return false;
                        }
                        3
                    }
                }
            }
        };
        ctx.set_cursor(cursor.advance(produced));
        true
    }

    fn run_ok(&self, ctx: &SearchContext, start: usize, len: usize) -> bool {
        self.plan
            .plausibility
            .accepts_run(&ctx.output()[start..start + len])
    }
}

impl std::fmt::Debug for DecodePredicate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodePredicate")
            .field("unknown", &self.plan.resolver.unknown().name())
            .field("layout", &self.plan.layout)
            .field("partition", &self.partition)
            .finish()
    }
}

impl Predicate for DecodePredicate<'_> {
    fn try_pred(&mut self, ctx: &mut SearchContext, round: usize) -> PredicateResult {
        if self.choices.len() <= round {
            self.choices.resize_with(round + 1, Vec::new);
        }
        loop {
            self.tick(ctx);
            let cursor = ctx.cursor();
            if cursor.ciphertext_index >= ctx.ciphertext().len() {
                // Until the split, every worker walks the same path; one reports it.
                if let (Some(partition), None) = (self.partition, self.split_round) {
                    if partition.worker != 0 {
                        return PredicateResult::Failure;
                    }
                }
                return PredicateResult::Success;
            }
            match self.plan.resolver.resolve(ctx, cursor, &mut self.choices[round]) {
                Step::Resolved => ctx.set_cursor(cursor.next_stage()),
                Step::Emit(symbol) => {
                    if !self.emit(ctx, cursor, symbol) {
                        return Self::prune(ctx);
                    }
                }
                Step::Branch => {
                    let n = self.choices[round].len();
                    if n == 0 {
                        return Self::prune(ctx);
                    }
                    ctx.statistics.increment(Counters::BranchPoints);
                    if let (Some(partition), None) = (self.partition, self.split_round) {
                        debug!(
                            "Worker {}/{} splits {} choices at ciphertext position {}",
                            partition.worker, partition.workers, n, cursor.ciphertext_index
                        );
                        self.split_round = Some(round);
                    }
                    return PredicateResult::Choices(n);
                }
                Step::Dead => return Self::prune(ctx),
            }
        }
    }

    fn retry_pred(&mut self, ctx: &mut SearchContext, round: usize, choice: usize) -> PredicateResult {
        if let Some(partition) = self.partition {
            if self.split_round == Some(round) && choice % partition.workers != partition.worker {
                return PredicateResult::Failure;
            }
        }
        Resolver::apply(ctx, self.choices[round][choice]);
        PredicateResult::SuccessSamePredicate
    }

    fn name(&self) -> &str {
        "Decode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::{AcceptAll, Printable};
    use crate::variants::Unknown;

    fn plan(unknown: Unknown, alphabet: Alphabet, layout: OutputLayout, test: Arc<dyn Plausibility>) -> DecodePlan {
        DecodePlan {
            resolver: Resolver::new(alphabet, unknown),
            layout,
            encoding: Alphabet::base64(),
            class: ByteClass::compile(test.as_ref()),
            plausibility: test,
            constraints: Vec::new(),
        }
    }

    /// A substitution plan where every slot is already fixed to the identity.
    fn identity_context(ciphertext: &[u8]) -> SearchContext {
        let alphabet = Alphabet::base64();
        let mut ctx = SearchContext::with_ciphertext(
            ciphertext.to_vec(),
            64,
            0,
            crate::codec::base64::decoded_len(ciphertext.len()).unwrap_or(0),
        );
        for (i, &s) in alphabet.as_bytes().iter().enumerate() {
            ctx.allocate(i as u8, s);
        }
        ctx
    }

    #[test]
    fn test_known_alphabet_decodes_in_one_round() {
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            Alphabet::base64(),
            OutputLayout::Base64,
            Arc::new(Printable::STRICT),
        );
        let mut ctx = identity_context(b"SGVsbG8gV29ybGRk");
        let mut pred = DecodePredicate::new(&plan);
        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Success);
        assert_eq!(ctx.plaintext(), b"Hello Worldd");
    }

    #[test]
    fn test_tail_group_decodes() {
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            Alphabet::base64(),
            OutputLayout::Base64,
            Arc::new(Printable::STRICT),
        );
        // "Hi!?" is SGkhPw, "Hi" is SGk
        for (text, plain) in [(&b"SGkhPw"[..], &b"Hi!?"[..]), (b"SGk", b"Hi")] {
            let mut ctx = identity_context(text);
            let mut pred = DecodePredicate::new(&plan);
            assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Success);
            assert_eq!(ctx.plaintext(), plain);
        }
    }

    #[test]
    fn test_tail_with_leftover_bits_is_pruned() {
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            Alphabet::base64(),
            OutputLayout::Base64,
            Arc::new(AcceptAll),
        );
        // 'x' has low bits set, so "SGx" leaves bits over.
        let mut ctx = identity_context(b"SGx");
        let mut pred = DecodePredicate::new(&plan);
        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Failure);
        assert_eq!(ctx.statistics.get(Counters::Prunes), 1);
    }

    #[test]
    fn test_non_ascii_pruned_at_first_sextet() {
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            Alphabet::base64(),
            OutputLayout::Base64,
            Arc::new(Printable::STRICT),
        );
        // '/' is sextet 63: byte 0 would start 0b1111_11xx.
        let mut ctx = identity_context(b"/AAA");
        let mut pred = DecodePredicate::new(&plan);
        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Failure);
        assert_eq!(ctx.cursor().ciphertext_index, 0);
    }

    #[test]
    fn test_branch_and_retry() {
        let alphabet = Alphabet::new(b"ABCD").unwrap();
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            alphabet,
            OutputLayout::Direct,
            Arc::new(AcceptAll),
        );
        let mut ctx = SearchContext::with_ciphertext(b"BB".to_vec(), 4, 0, 2);
        let mut pred = DecodePredicate::new(&plan);

        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Choices(4));
        assert_eq!(pred.retry_pred(&mut ctx, 0, 2), PredicateResult::SuccessSamePredicate);
        assert_eq!(pred.try_pred(&mut ctx, 1), PredicateResult::Success);
        assert_eq!(ctx.plaintext(), b"CC");
        assert_eq!(ctx.statistics.get(Counters::BranchPoints), 1);
    }

    #[test]
    fn test_partition_skips_other_workers_choices() {
        let alphabet = Alphabet::new(b"ABCD").unwrap();
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            alphabet,
            OutputLayout::Direct,
            Arc::new(AcceptAll),
        );
        let mut ctx = SearchContext::with_ciphertext(b"AB".to_vec(), 4, 0, 2);
        let mut pred = DecodePredicate::new(&plan).with_partition(Partition { worker: 1, workers: 2 });

        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Choices(4));
        assert_eq!(pred.retry_pred(&mut ctx, 0, 0), PredicateResult::Failure);
        assert_eq!(pred.retry_pred(&mut ctx, 0, 1), PredicateResult::SuccessSamePredicate);

        // Later branch points are not partitioned.
        assert_eq!(pred.try_pred(&mut ctx, 1), PredicateResult::Choices(3));
        assert_eq!(pred.retry_pred(&mut ctx, 1, 0), PredicateResult::SuccessSamePredicate);
        assert_eq!(pred.try_pred(&mut ctx, 2), PredicateResult::Success);
    }

    #[test]
    fn test_unsplit_solution_reported_by_first_worker_only() {
        let alphabet = Alphabet::new(b"ABCD").unwrap();
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            alphabet,
            OutputLayout::Direct,
            Arc::new(AcceptAll),
        );
        let fixed = || {
            let mut ctx = SearchContext::with_ciphertext(b"AB".to_vec(), 4, 0, 2);
            ctx.allocate(0, b'D');
            ctx.allocate(1, b'C');
            ctx
        };

        for worker in 0..3 {
            let mut ctx = fixed();
            let mut pred = DecodePredicate::new(&plan).with_partition(Partition { worker, workers: 3 });
            let expected = if worker == 0 {
                PredicateResult::Success
            } else {
                PredicateResult::Failure
            };
            assert_eq!(pred.try_pred(&mut ctx, 0), expected, "worker {worker}");
        }
    }

    #[test]
    fn test_constraint_prunes() {
        let mut plan = plan(
            Unknown::SubstitutionAlphabet,
            Alphabet::new(b"ABCD").unwrap(),
            OutputLayout::Direct,
            Arc::new(AcceptAll),
        );
        plan.constraints = vec![SymbolConstraint { value: b'D', mask: 0xff }];
        let mut ctx = SearchContext::with_ciphertext(b"A".to_vec(), 4, 0, 1);
        ctx.allocate(0, b'C');
        let mut pred = DecodePredicate::new(&plan);
        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Failure);
    }

    #[test]
    fn test_progress_called_every_interval() {
        let plan = plan(
            Unknown::SubstitutionAlphabet,
            Alphabet::base64(),
            OutputLayout::Base64,
            Arc::new(Printable::STRICT),
        );
        let mut ctx = identity_context(b"SGVsbG8g");
        let mut calls = 0;
        let mut callback = |_: &SearchContext| calls += 1;
        let mut pred = DecodePredicate::new(&plan).with_progress(Progress {
            interval: 3,
            callback: &mut callback,
        });
        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Success);
        drop(pred);
        // 8 symbols plus the final check make 9 steps.
        assert_eq!(calls, 3);
    }
}
