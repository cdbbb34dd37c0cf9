// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search configuration and entry points.
//!
//! A [`SearchConfig`] is validated once by [`SearchConfig::prepare`]. Every
//! configuration error is reported there, so the descent itself never
//! fails except by finding nothing.
//!
//! Cribs are compiled into per-position constraints and into seed choices
//! that are applied to a fresh context and frozen on its trail before the
//! search starts.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info};

use super::{Choice, OutputLayout, Resolver, Unknown};
use crate::alphabet::Alphabet;
use crate::codec::base64;
use crate::context::SearchContext;
use crate::engine::EngineBuilder;
use crate::error::{Result, SearchError};
use crate::heuristic::{ByteClass, Plausibility, Printable};
use crate::predicates::{
    DecodePlan, DecodePredicate, FailPredicate, Partition, Progress, ReportPredicate, Solution,
    SymbolConstraint,
};
use crate::state::{AssignmentState, Counters, Statistics};

/// Largest supported key buffer.
pub const MAX_KEY_LEN: usize = 256;

/// Known material that narrows the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crib {
    /// The plaintext starts with these bytes.
    Plaintext(Vec<u8>),
    /// The unknown key starts with these symbols.
    Key(Vec<u8>),
    /// Some slots of the unknown alphabet; one entry per slot.
    Alphabet(Vec<Option<u8>>),
}

/// Everything needed to start a search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    ciphertext: Vec<u8>,
    alphabet: Alphabet,
    encoding: Alphabet,
    unknown: Unknown,
    layout: OutputLayout,
    plausibility: Arc<dyn Plausibility>,
    cribs: Vec<Crib>,
}

impl SearchConfig {
    /// Base64 alphabet and layout, strict printable output.
    pub fn new(ciphertext: impl Into<Vec<u8>>, unknown: Unknown) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            alphabet: Alphabet::base64(),
            encoding: Alphabet::base64(),
            unknown,
            layout: OutputLayout::Base64,
            plausibility: Arc::new(Printable::STRICT),
            cribs: Vec::new(),
        }
    }

    /// The cipher alphabet: ciphertext symbols, and the tableau for key searches.
    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// The Base64 alphabet that maps decoded symbols to sextets.
    pub fn with_encoding(mut self, encoding: Alphabet) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_plausibility(mut self, plausibility: impl Plausibility + 'static) -> Self {
        self.plausibility = Arc::new(plausibility);
        self
    }

    pub fn with_shared_plausibility(mut self, plausibility: Arc<dyn Plausibility>) -> Self {
        self.plausibility = plausibility;
        self
    }

    pub fn with_crib(mut self, crib: Crib) -> Self {
        self.cribs.push(crib);
        self
    }

    pub fn unknown(&self) -> &Unknown {
        &self.unknown
    }

    /// Validate the configuration and compile its cribs.
    pub fn prepare(&self) -> Result<PreparedSearch> {
        let ciphertext = match self.layout {
            OutputLayout::Base64 => base64::strip_padding(&self.ciphertext).to_vec(),
            OutputLayout::Direct => self.ciphertext.clone(),
        };
        let output_len = self.check_ciphertext(&ciphertext)?;
        self.check_unknown()?;

        let resolver = Resolver::new(self.alphabet.clone(), self.unknown.clone());
        let mut cribs = CribCompiler::new(self, &ciphertext, output_len);
        for crib in &self.cribs {
            cribs.add(crib)?;
        }
        let (constraints, seeds) = cribs.finish()?;

        let plan = DecodePlan {
            resolver,
            layout: self.layout,
            encoding: self.encoding.clone(),
            class: ByteClass::compile(self.plausibility.as_ref()),
            plausibility: Arc::clone(&self.plausibility),
            constraints,
        };
        let trail_limit = trail_limit(&self.unknown, ciphertext.len(), self.alphabet.len());
        Ok(PreparedSearch {
            plan,
            ciphertext,
            output_len,
            seeds,
            trail_limit,
        })
    }

    /// Returns the output length.
    fn check_ciphertext(&self, ciphertext: &[u8]) -> Result<usize> {
        let len = ciphertext.len();
        let output_len = match self.layout {
            OutputLayout::Base64 => {
                if len < 2 {
                    return Err(SearchError::CiphertextTooShort { len, min: 2 });
                }
                if self.encoding.len() != 64 {
                    return Err(SearchError::NotBase64(self.encoding.len()));
                }
                if !self.alphabet.same_symbols(&self.encoding) {
                    return Err(SearchError::AlphabetMismatch(format!(
                        "cipher alphabet {:?} and Base64 encoding {:?} must hold the same symbols",
                        self.alphabet, self.encoding
                    )));
                }
                base64::decoded_len(len).ok_or(SearchError::DanglingSymbol(len))?
            }
            OutputLayout::Direct => {
                if len < 1 {
                    return Err(SearchError::CiphertextTooShort { len, min: 1 });
                }
                len
            }
        };
        self.alphabet.check_members(ciphertext, "ciphertext")?;
        Ok(output_len)
    }

    fn check_unknown(&self) -> Result<()> {
        let check_max = |max_key_len: usize| {
            if (1..=MAX_KEY_LEN).contains(&max_key_len) {
                Ok(())
            } else {
                Err(SearchError::KeyLength {
                    len: max_key_len,
                    max: MAX_KEY_LEN,
                })
            }
        };
        match &self.unknown {
            Unknown::SubstitutionAlphabet => Ok(()),
            Unknown::VigenereAlphabet { key } => {
                if key.is_empty() {
                    return Err(SearchError::EmptyKey("Vigenère alphabet search"));
                }
                self.alphabet.check_members(key, "key")
            }
            Unknown::VigenereKey {
                key_alphabet,
                max_key_len,
            } => {
                check_max(*max_key_len)?;
                self.alphabet.check_members(key_alphabet.as_bytes(), "key alphabet")
            }
            Unknown::DoubleVigenereKey {
                known_key,
                known_alphabet,
                key_alphabet,
                max_key_len,
                ..
            } => {
                check_max(*max_key_len)?;
                if known_key.is_empty() {
                    return Err(SearchError::EmptyKey("double Vigenère key search"));
                }
                let known = known_alphabet.as_ref().unwrap_or(&self.alphabet);
                if !known.same_symbols(&self.alphabet) {
                    return Err(SearchError::AlphabetMismatch(format!(
                        "known layer alphabet {:?} and cipher alphabet {:?} must hold the same symbols",
                        known, self.alphabet
                    )));
                }
                known.check_members(known_key, "known key")?;
                self.alphabet.check_members(key_alphabet.as_bytes(), "key alphabet")
            }
        }
    }
}

/// Most undo records outstanding on any path of a search.
///
/// Each symbol records one cursor move per stage and at most two output
/// writes. Allocations, key symbols and the key freeze are bounded by the
/// alphabet and the key buffer.
fn trail_limit(unknown: &Unknown, len: usize, alphabet_len: usize) -> usize {
    len * (unknown.stages() + 2) + alphabet_len + unknown.max_key_len() + 1
}

/// Constraint on each bit of the 6-bit groups covering `plain`.
///
/// The last group may be partial; its uncovered low bits are left free.
fn sextet_constraints(plain: &[u8]) -> Vec<SymbolConstraint> {
    let bits = plain.len() * 8;
    let mut out = vec![SymbolConstraint { value: 0, mask: 0 }; bits.div_ceil(6)];
    for b in 0..bits {
        let bit = (plain[b / 8] >> (7 - b % 8)) & 1;
        let shift = 5 - b % 6;
        let c = &mut out[b / 6];
        c.mask |= 1 << shift;
        c.value |= bit << shift;
    }
    out
}

/// Accumulates cribs, checking each against the others.
struct CribCompiler<'a> {
    config: &'a SearchConfig,
    ciphertext: &'a [u8],
    output_len: usize,
    constraints: Vec<SymbolConstraint>,
    alphabet_crib: Option<Vec<Option<u8>>>,
    key_prefix: Vec<u8>,
}

impl<'a> CribCompiler<'a> {
    fn new(config: &'a SearchConfig, ciphertext: &'a [u8], output_len: usize) -> Self {
        Self {
            config,
            ciphertext,
            output_len,
            constraints: Vec::new(),
            alphabet_crib: None,
            key_prefix: Vec::new(),
        }
    }

    fn add(&mut self, crib: &Crib) -> Result<()> {
        match crib {
            Crib::Plaintext(plain) => self.add_plaintext(plain),
            Crib::Key(key) => self.add_key(key),
            Crib::Alphabet(slots) => self.add_alphabet(slots),
        }
    }

    fn add_plaintext(&mut self, plain: &[u8]) -> Result<()> {
        if plain.len() > self.output_len {
            return Err(SearchError::Crib(format!(
                "plaintext crib of {} bytes is longer than the {} byte output",
                plain.len(),
                self.output_len
            )));
        }
        let compiled = match self.config.layout {
            OutputLayout::Base64 => sextet_constraints(plain),
            OutputLayout::Direct => plain
                .iter()
                .map(|&value| SymbolConstraint { value, mask: 0xff })
                .collect(),
        };
        if self.constraints.len() < compiled.len() {
            self.constraints
                .resize(compiled.len(), SymbolConstraint { value: 0, mask: 0 });
        }
        for (pos, (old, new)) in self.constraints.iter_mut().zip(&compiled).enumerate() {
            let shared = old.mask & new.mask;
            if (old.value ^ new.value) & shared != 0 {
                return Err(SearchError::Crib(format!(
                    "plaintext cribs disagree at ciphertext position {pos}"
                )));
            }
            old.mask |= new.mask;
            old.value |= new.value;
        }
        Ok(())
    }

    fn add_key(&mut self, key: &[u8]) -> Result<()> {
        let unknown = &self.config.unknown;
        let Some(key_alphabet) = unknown.key_alphabet() else {
            return Err(SearchError::Crib(format!(
                "a key crib needs a key search, not a {} search",
                unknown.name()
            )));
        };
        if key.len() > unknown.max_key_len() {
            return Err(SearchError::KeyLength {
                len: key.len(),
                max: unknown.max_key_len(),
            });
        }
        key_alphabet.check_members(key, "key crib")?;
        let shared = key.len().min(self.key_prefix.len());
        if key[..shared] != self.key_prefix[..shared] {
            return Err(SearchError::Crib("key cribs disagree".to_string()));
        }
        if key.len() > self.key_prefix.len() {
            self.key_prefix = key.to_vec();
        }
        Ok(())
    }

    fn add_alphabet(&mut self, slots: &[Option<u8>]) -> Result<()> {
        let unknown = &self.config.unknown;
        if !unknown.searches_alphabet() {
            return Err(SearchError::Crib(format!(
                "an alphabet crib needs an alphabet search, not a {} search",
                unknown.name()
            )));
        }
        let alphabet = &self.config.alphabet;
        if slots.len() != alphabet.len() {
            return Err(SearchError::Crib(format!(
                "alphabet crib has {} slots, the alphabet has {}",
                slots.len(),
                alphabet.len()
            )));
        }
        let merged = self
            .alphabet_crib
            .get_or_insert_with(|| vec![None; alphabet.len()]);
        for (slot, (old, &new)) in merged.iter_mut().zip(slots).enumerate() {
            match (*old, new) {
                (_, None) => {}
                (None, Some(symbol)) => *old = Some(symbol),
                (Some(a), Some(b)) if a == b => {}
                (Some(_), Some(_)) => {
                    return Err(SearchError::Crib(format!("alphabet cribs disagree at slot {slot}")));
                }
            }
        }
        Ok(())
    }

    /// Check the cribs against each other and turn them into seed choices.
    fn finish(self) -> Result<(Vec<SymbolConstraint>, Vec<Choice>)> {
        let config = self.config;
        let alphabet = &config.alphabet;
        if self.constraints.len() > self.ciphertext.len() {
            return Err(SearchError::Crib(
                "plaintext crib extends past the ciphertext".to_string(),
            ));
        }

        let mut seeds = Vec::new();
        let mut scratch = AssignmentState::new(alphabet.len());
        let bind = |scratch: &mut AssignmentState, seeds: &mut Vec<Choice>, slot: u8, symbol: u8| -> Result<()> {
            if scratch.symbol_at(slot) == Some(symbol) {
                return Ok(());
            }
            if scratch.symbol_at(slot).is_some() || scratch.slot_of(symbol).is_some() {
                return Err(SearchError::Crib(format!(
                    "symbol {:?} cannot be placed in slot {slot}",
                    symbol as char
                )));
            }
            scratch.allocate(slot, symbol);
            seeds.push(Choice::Allocate { slot, symbol });
            Ok(())
        };

        if let Some(slots) = &self.alphabet_crib {
            for (slot, symbol) in slots.iter().enumerate() {
                if let &Some(symbol) = symbol {
                    alphabet.check_members(&[symbol], "alphabet crib")?;
                    bind(&mut scratch, &mut seeds, slot as u8, symbol)?;
                }
            }
        }

        // A substitution maps each fully constrained ciphertext symbol directly.
        if matches!(config.unknown, Unknown::SubstitutionAlphabet) {
            for (pos, c) in self.constraints.iter().enumerate() {
                let symbol = match config.layout {
                    OutputLayout::Base64 if c.mask == 0x3f => config.encoding.symbol(c.value),
                    OutputLayout::Direct if c.mask == 0xff => c.value,
                    _ => continue,
                };
                if !alphabet.contains(symbol) {
                    return Err(SearchError::Crib(format!(
                        "plaintext symbol {:?} is not in the alphabet",
                        symbol as char
                    )));
                }
                let Some(slot) = alphabet.index_of(self.ciphertext[pos]) else {
                    continue;
                };
                bind(&mut scratch, &mut seeds, slot, symbol)?;
            }
        }

        seeds.extend(self.key_prefix.iter().map(|&s| Choice::ExtendKey(s)));
        Ok((self.constraints, seeds))
    }
}

/// A validated search, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    plan: DecodePlan,
    ciphertext: Vec<u8>,
    output_len: usize,
    seeds: Vec<Choice>,
    trail_limit: usize,
}

/// Solutions and counters from a collecting run.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub solutions: Vec<Solution>,
    pub statistics: Statistics,
    /// False when the run stopped early at a solution limit.
    pub exhausted: bool,
}

impl PreparedSearch {
    pub fn plan(&self) -> &DecodePlan {
        &self.plan
    }

    /// The ciphertext without padding.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// A fresh context with the cribs applied and frozen.
    pub fn context(&self) -> SearchContext {
        let unknown = self.plan.resolver.unknown();
        let mut ctx = SearchContext::with_ciphertext(
            self.ciphertext.clone(),
            self.plan.resolver.alphabet().len(),
            unknown.max_key_len(),
            self.output_len,
        )
        .with_trail_limit(self.trail_limit);
        for &seed in &self.seeds {
            Resolver::apply(&mut ctx, seed);
        }
        ctx.trail.freeze();
        if !self.seeds.is_empty() {
            debug!(
                "Seeded {} from cribs: alphabet={} key={:?}",
                unknown.name(),
                ctx.assignment().render(b'_'),
                String::from_utf8_lossy(ctx.key().as_slice())
            );
        }
        ctx
    }

    /// Search a fresh context, calling `on_solution` for each solution.
    ///
    /// Returns the counters for this run.
    pub fn run<F>(&self, on_solution: F) -> Statistics
    where
        F: FnMut(&Solution) -> ControlFlow<()>,
    {
        let mut ctx = self.context();
        self.run_in(&mut ctx, on_solution)
    }

    /// Search in `ctx`, which is left exactly as it was found.
    pub fn run_in<F>(&self, ctx: &mut SearchContext, mut on_solution: F) -> Statistics
    where
        F: FnMut(&Solution) -> ControlFlow<()>,
    {
        let before = ctx.statistics.clone();
        self.execute(ctx, &mut on_solution, None, None);
        ctx.statistics.since(&before)
    }

    /// As [`run`](Self::run), also calling `progress` every `interval` driver steps.
    pub fn run_with_progress<P, F>(&self, interval: u64, mut progress: P, mut on_solution: F) -> Statistics
    where
        P: FnMut(&SearchContext),
        F: FnMut(&Solution) -> ControlFlow<()>,
    {
        let mut ctx = self.context();
        let progress = Progress {
            interval,
            callback: &mut progress,
        };
        self.execute(&mut ctx, &mut on_solution, Some(progress), None);
        ctx.statistics
    }

    /// Every solution, in search order.
    pub fn collect(&self) -> SearchReport {
        self.collect_up_to(None)
    }

    /// Solutions in search order, stopping after `limit` if given.
    pub fn collect_up_to(&self, limit: Option<usize>) -> SearchReport {
        let mut ctx = self.context();
        let mut solutions = Vec::new();
        let exhausted = self.execute(
            &mut ctx,
            &mut |s: &Solution| {
                solutions.push(s.clone());
                if limit.is_some_and(|limit| solutions.len() >= limit) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
            None,
            None,
        );
        SearchReport {
            solutions,
            statistics: ctx.statistics,
            exhausted,
        }
    }

    /// Split the first branch point across `threads` workers.
    ///
    /// Without a limit the solutions are the same as [`collect`](Self::collect)
    /// gives, sorted. With a limit, which solutions are kept depends on timing.
    pub fn run_parallel(&self, threads: usize, limit: Option<usize>) -> SearchReport {
        let workers = threads.max(1);
        if workers == 1 {
            return self.collect_up_to(limit);
        }
        let found = AtomicUsize::new(0);

        let results: Vec<(Vec<Solution>, Statistics, bool)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let found = &found;
                    scope.spawn(move || {
                        let mut ctx = self.context();
                        let mut solutions = Vec::new();
                        let exhausted = self.execute(
                            &mut ctx,
                            &mut |s: &Solution| {
                                solutions.push(s.clone());
                                let total = found.fetch_add(1, Ordering::Relaxed) + 1;
                                if limit.is_some_and(|limit| total >= limit) {
                                    ControlFlow::Break(())
                                } else {
                                    ControlFlow::Continue(())
                                }
                            },
                            None,
                            Some(Partition { worker, workers }),
                        );
                        (solutions, ctx.statistics, exhausted)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut report = SearchReport {
            exhausted: true,
            ..SearchReport::default()
        };
        for (solutions, statistics, exhausted) in results {
            report.solutions.extend(solutions);
            report.statistics.absorb(&statistics);
            report.exhausted &= exhausted;
        }
        report.solutions.sort();
        if let Some(limit) = limit {
            report.solutions.truncate(limit);
        }
        report
    }

    /// Run the program `Decode, Count, Report, Fail` in `ctx`.
    ///
    /// Returns true when the search space was exhausted. Either way `ctx`
    /// is rewound to where it started.
    fn execute<'a>(
        &'a self,
        ctx: &mut SearchContext,
        on_solution: &'a mut dyn FnMut(&Solution) -> ControlFlow<()>,
        progress: Option<Progress<'a>>,
        partition: Option<Partition>,
    ) -> bool {
        let unknown = self.plan.resolver.unknown();
        info!(
            "Searching for {} over {} ciphertext symbols{}",
            unknown.name(),
            self.ciphertext.len(),
            partition.map_or(String::new(), |p| format!(" (worker {}/{})", p.worker, p.workers))
        );

        let mut decode = DecodePredicate::new(&self.plan);
        if let Some(partition) = partition {
            decode = decode.with_partition(partition);
        }
        if let Some(progress) = progress {
            decode = decode.with_progress(progress);
        }
        let before = ctx.statistics.clone();
        let base = ctx.trail.checkpoint();
        let engine = EngineBuilder::new()
            .add(Box::new(decode))
            .add(Statistics::counting_predicate(Counters::Solutions, None))
            .add(Box::new(ReportPredicate::new(
                on_solution,
                unknown.searches_alphabet(),
                unknown.searches_key(),
            )))
            .terminal(Box::new(FailPredicate))
            .build();

        let exhausted = match engine.search(ctx) {
            None => true,
            Some(_) => {
                ctx.rewind_to(base);
                false
            }
        };

        let delta = ctx.statistics.since(&before);
        info!(
            "Search {} after {} steps: {} solutions, {} branch points, {} prunes",
            if exhausted { "exhausted" } else { "stopped" },
            delta.get(Counters::Steps),
            delta.get(Counters::Solutions),
            delta.get(Counters::BranchPoints),
            delta.get(Counters::Prunes)
        );
        exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::AcceptAll;

    fn letters_key_search(ciphertext: &[u8]) -> SearchConfig {
        SearchConfig::new(
            ciphertext,
            Unknown::VigenereKey {
                key_alphabet: Alphabet::new(b"ABCabc").unwrap(),
                max_key_len: 4,
            },
        )
    }

    #[test]
    fn test_trail_sized_from_ciphertext() {
        let alphabet_search = SearchConfig::new(vec![b'A'; 8], Unknown::VigenereAlphabet { key: b"B".to_vec() })
            .prepare()
            .unwrap();
        assert_eq!(alphabet_search.context().trail.limit(), 8 * 5 + 64 + 1);

        let key_search = letters_key_search(&vec![b'A'; 400_000]).prepare().unwrap();
        let ctx = key_search.context();
        assert_eq!(ctx.trail.limit(), 400_000 * 3 + 64 + 4 + 1);
        assert!(ctx.trail.limit() > crate::trail::Trail::MAX_SIZE);
    }

    #[test]
    fn test_sextet_constraints_mask_partial_tail() {
        // "Hi" is SGk with 2 free low bits in the last sextet.
        let c = sextet_constraints(b"Hi");
        assert_eq!(
            c,
            vec![
                SymbolConstraint { value: 18, mask: 0x3f },
                SymbolConstraint { value: 6, mask: 0x3f },
                SymbolConstraint { value: 36, mask: 0x3c },
            ]
        );
    }

    #[test]
    fn test_rejects_bad_ciphertext() {
        let sub = |text: &[u8]| SearchConfig::new(text, Unknown::SubstitutionAlphabet).prepare();
        assert_eq!(
            sub(b"").unwrap_err(),
            SearchError::CiphertextTooShort { len: 0, min: 2 }
        );
        assert_eq!(sub(b"ABCDE").unwrap_err(), SearchError::DanglingSymbol(5));
        assert!(matches!(
            sub(b"AB#C").unwrap_err(),
            SearchError::UnknownSymbol { symbol: '#', position: 2, .. }
        ));
        // Padding is stripped before the length checks.
        assert!(sub(b"SGk=").is_ok());
    }

    #[test]
    fn test_rejects_bad_unknowns() {
        let err = SearchConfig::new(b"SGVs", Unknown::VigenereAlphabet { key: Vec::new() })
            .prepare()
            .unwrap_err();
        assert_eq!(err, SearchError::EmptyKey("Vigenère alphabet search"));

        let err = SearchConfig::new(
            b"SGVs",
            Unknown::VigenereKey {
                key_alphabet: Alphabet::base64(),
                max_key_len: MAX_KEY_LEN + 1,
            },
        )
        .prepare()
        .unwrap_err();
        assert_eq!(
            err,
            SearchError::KeyLength {
                len: MAX_KEY_LEN + 1,
                max: MAX_KEY_LEN
            }
        );

        let err = SearchConfig::new(
            b"SGVs",
            Unknown::DoubleVigenereKey {
                known_key: b"K".to_vec(),
                known_alphabet: Some(Alphabet::latin_upper()),
                order: Default::default(),
                key_alphabet: Alphabet::base64(),
                max_key_len: 2,
            },
        )
        .prepare()
        .unwrap_err();
        assert!(matches!(err, SearchError::AlphabetMismatch(_)));
    }

    #[test]
    fn test_rejects_mismatched_encoding() {
        let err = SearchConfig::new(b"ABCD", Unknown::SubstitutionAlphabet)
            .with_alphabet(Alphabet::latin_upper())
            .prepare()
            .unwrap_err();
        assert!(matches!(err, SearchError::AlphabetMismatch(_)));

        let ok = SearchConfig::new(b"ABCD", Unknown::SubstitutionAlphabet)
            .with_alphabet(Alphabet::latin_upper())
            .with_layout(OutputLayout::Direct)
            .prepare();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_contradictory_cribs() {
        let err = SearchConfig::new(b"SGVsbG8g", Unknown::SubstitutionAlphabet)
            .with_crib(Crib::Plaintext(b"Hel".to_vec()))
            .with_crib(Crib::Plaintext(b"Hal".to_vec()))
            .prepare()
            .unwrap_err();
        assert!(matches!(err, SearchError::Crib(_)));

        // Both positions 0 and 1 hold 'A' but must decode differently.
        let err = SearchConfig::new(b"AAAA", Unknown::SubstitutionAlphabet)
            .with_crib(Crib::Plaintext(b"Hel".to_vec()))
            .prepare()
            .unwrap_err();
        assert!(matches!(err, SearchError::Crib(_)));
    }

    #[test]
    fn test_crib_kind_must_match_unknown() {
        let err = SearchConfig::new(b"SGVs", Unknown::SubstitutionAlphabet)
            .with_crib(Crib::Key(b"A".to_vec()))
            .prepare()
            .unwrap_err();
        assert!(matches!(err, SearchError::Crib(_)));

        let err = letters_key_search(b"SGVs")
            .with_crib(Crib::Alphabet(vec![None; 64]))
            .prepare()
            .unwrap_err();
        assert!(matches!(err, SearchError::Crib(_)));

        let err = letters_key_search(b"SGVs")
            .with_crib(Crib::Key(b"ABCab".to_vec()))
            .prepare()
            .unwrap_err();
        assert_eq!(err, SearchError::KeyLength { len: 5, max: 4 });
    }

    #[test]
    fn test_plaintext_crib_seeds_substitution() {
        let search = SearchConfig::new(b"SGVsbG8g", Unknown::SubstitutionAlphabet)
            .with_plausibility(AcceptAll)
            .with_crib(Crib::Plaintext(b"Hel".to_vec()))
            .prepare()
            .unwrap();
        let ctx = search.context();
        let a = Alphabet::base64();
        for &symbol in b"SGVs" {
            let slot = a.index_of(symbol).unwrap();
            assert_eq!(ctx.assignment().symbol_at(slot), Some(symbol));
        }
        assert_eq!(ctx.trail.frozen_len(), 4);
    }

    #[test]
    fn test_key_crib_seeds_key() {
        let search = letters_key_search(b"SGVs")
            .with_crib(Crib::Key(b"Ab".to_vec()))
            .with_crib(Crib::Key(b"A".to_vec()))
            .prepare()
            .unwrap();
        assert_eq!(search.context().key().as_slice(), b"Ab");

        let err = letters_key_search(b"SGVs")
            .with_crib(Crib::Key(b"Ab".to_vec()))
            .with_crib(Crib::Key(b"B".to_vec()))
            .prepare()
            .unwrap_err();
        assert!(matches!(err, SearchError::Crib(_)));
    }

    #[test]
    fn test_stopped_run_leaves_context_unchanged() {
        let search = SearchConfig::new(b"AB", Unknown::SubstitutionAlphabet)
            .with_alphabet(Alphabet::new(b"ABCD").unwrap())
            .with_layout(OutputLayout::Direct)
            .with_plausibility(AcceptAll)
            .prepare()
            .unwrap();
        let mut ctx = search.context();
        let before = ctx.snapshot();
        let mut seen = 0;
        let stats = search.run_in(&mut ctx, |_| {
            seen += 1;
            if seen == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, 3);
        assert_eq!(stats.get(Counters::Solutions), 3);
        assert_eq!(ctx.snapshot(), before);
    }
}
