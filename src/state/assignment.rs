// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Partial bijection between alphabet slots and symbols.
//!
//! Both directions are kept as flat tables so every lookup is a single load,
//! and the free slots are a bit mask so enumerating candidates is a scan of
//! set bits in ascending order.

use std::panic::{self, AssertUnwindSafe};

use crate::alphabet::{Alphabet, MAX_ALPHABET_SIZE};

/// A value already bound, or the candidates to branch over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<I> {
    Bound(u8),
    Branch(I),
}

/// A partial assignment of symbols to the slots `0..size`.
///
/// Invariant: `slot_to_symbol[i] == Some(s)` iff `symbol_to_slot[s] == Some(i)`,
/// and bit `i` of `free` is set iff slot `i` is unassigned.
#[derive(Clone, PartialEq, Eq)]
pub struct AssignmentState {
    size: u8,
    slot_to_symbol: [Option<u8>; MAX_ALPHABET_SIZE],
    symbol_to_slot: [Option<u8>; 256],
    free: u64,
}

fn full_mask(size: u8) -> u64 {
    if size as usize >= MAX_ALPHABET_SIZE {
        u64::MAX
    } else {
        (1u64 << size) - 1
    }
}

impl AssignmentState {
    /// An empty assignment over `size` slots.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds 64.
    pub fn new(size: usize) -> Self {
        assert!(
            size <= MAX_ALPHABET_SIZE,
            "Assignment size {size} exceeds {MAX_ALPHABET_SIZE}"
        );
        Self {
            size: size as u8,
            slot_to_symbol: [None; MAX_ALPHABET_SIZE],
            symbol_to_slot: [None; 256],
            free: full_mask(size as u8),
        }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Bind `symbol` to `slot`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is out of range or occupied, or the symbol is
    /// already bound. Callers only allocate candidates they enumerated, so
    /// any of these is a defect in the caller.
    pub fn allocate(&mut self, slot: u8, symbol: u8) {
        assert!(slot < self.size, "Slot {slot} out of range 0..{}", self.size);
        if let Some(existing) = self.slot_to_symbol[slot as usize] {
            panic!(
                "Slot {slot} already holds {:?}, cannot allocate {:?}",
                existing as char, symbol as char
            );
        }
        if let Some(existing) = self.symbol_to_slot[symbol as usize] {
            panic!(
                "Symbol {:?} already bound to slot {existing}, cannot allocate slot {slot}",
                symbol as char
            );
        }
        self.slot_to_symbol[slot as usize] = Some(symbol);
        self.symbol_to_slot[symbol as usize] = Some(slot);
        self.free &= !(1u64 << slot);
    }

    /// Unbind `slot`, returning the symbol it held.
    ///
    /// # Panics
    ///
    /// Panics if the slot is free.
    pub fn deallocate(&mut self, slot: u8) -> u8 {
        let Some(symbol) = self.slot_to_symbol[slot as usize].take() else {
            panic!("Deallocating free slot {slot}");
        };
        self.symbol_to_slot[symbol as usize] = None;
        self.free |= 1u64 << slot;
        symbol
    }

    #[inline]
    pub fn slot_of(&self, symbol: u8) -> Option<u8> {
        self.symbol_to_slot[symbol as usize]
    }

    #[inline]
    pub fn symbol_at(&self, slot: u8) -> Option<u8> {
        self.slot_to_symbol[slot as usize]
    }

    #[inline]
    pub fn is_free(&self, slot: u8) -> bool {
        self.free & (1u64 << slot) != 0
    }

    pub fn free_count(&self) -> usize {
        self.free.count_ones() as usize
    }

    /// Free slots in ascending order.
    pub fn free_slots(&self) -> FreeSlots {
        FreeSlots(self.free)
    }

    /// Symbols of `domain`, in domain order, not yet bound to any slot.
    pub fn unassigned_symbols<'a>(&'a self, domain: &'a Alphabet) -> impl Iterator<Item = u8> + 'a {
        domain
            .as_bytes()
            .iter()
            .copied()
            .filter(move |&symbol| self.slot_of(symbol).is_none())
    }

    /// The slot table, one entry per slot.
    pub fn slots(&self) -> &[Option<u8>] {
        &self.slot_to_symbol[..self.size as usize]
    }

    /// The slot of `symbol`, or the free slots it could take.
    pub fn lookup_slot(&self, symbol: u8) -> Resolution<FreeSlots> {
        match self.slot_of(symbol) {
            Some(slot) => Resolution::Bound(slot),
            None => Resolution::Branch(self.free_slots()),
        }
    }

    /// The symbol at `slot`, or the unbound symbols of `domain` it could hold.
    pub fn lookup_symbol<'a>(
        &'a self,
        slot: u8,
        domain: &'a Alphabet,
    ) -> Resolution<impl Iterator<Item = u8> + 'a> {
        match self.symbol_at(slot) {
            Some(symbol) => Resolution::Bound(symbol),
            None => Resolution::Branch(self.unassigned_symbols(domain)),
        }
    }

    /// Call `then` with the slot of `symbol`; when it is unbound, try every
    /// free slot in ascending order, undoing each binding afterwards.
    ///
    /// The search driver branches over the same candidates through
    /// [`lookup_slot`](Self::lookup_slot).
    pub fn resolve_or_branch<F>(&mut self, symbol: u8, mut then: F)
    where
        F: FnMut(&mut Self, u8),
    {
        match self.lookup_slot(symbol) {
            Resolution::Bound(slot) => then(self, slot),
            Resolution::Branch(slots) => {
                for slot in slots {
                    self.with_binding(slot, symbol, slot, &mut then);
                }
            }
        }
    }

    /// Call `then` with the symbol at `slot`; when it is free, try every
    /// unbound symbol of `domain` in order, undoing each binding afterwards.
    ///
    /// The search driver branches over the same candidates through
    /// [`lookup_symbol`](Self::lookup_symbol).
    pub fn resolve_index_or_branch<F>(&mut self, slot: u8, domain: &Alphabet, mut then: F)
    where
        F: FnMut(&mut Self, u8),
    {
        let candidates = match self.lookup_symbol(slot, domain) {
            Resolution::Bound(symbol) => Resolution::Bound(symbol),
            Resolution::Branch(symbols) => Resolution::Branch(symbols.collect::<Vec<u8>>()),
        };
        match candidates {
            Resolution::Bound(symbol) => then(self, symbol),
            Resolution::Branch(symbols) => {
                for symbol in symbols {
                    self.with_binding(slot, symbol, symbol, &mut then);
                }
            }
        }
    }

    /// Bind, call `then` with `value`, and unbind even if `then` panics.
    fn with_binding<F>(&mut self, slot: u8, symbol: u8, value: u8, then: &mut F)
    where
        F: FnMut(&mut Self, u8),
    {
        self.allocate(slot, symbol);
        let result = panic::catch_unwind(AssertUnwindSafe(|| then(self, value)));
        self.deallocate(slot);
        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }

    /// Check the bijection invariant in full.
    pub fn is_consistent(&self) -> bool {
        for slot in 0..self.size {
            match self.slot_to_symbol[slot as usize] {
                Some(symbol) => {
                    if self.symbol_to_slot[symbol as usize] != Some(slot) || self.is_free(slot) {
                        return false;
                    }
                }
                None => {
                    if !self.is_free(slot) {
                        return false;
                    }
                }
            }
        }
        let bound = self.symbol_to_slot.iter().filter(|s| s.is_some()).count();
        bound + self.free_count() == self.size as usize
            && self.free & !full_mask(self.size) == 0
    }

    /// The slot table as text, with `placeholder` for free slots.
    pub fn render(&self, placeholder: u8) -> String {
        self.slots()
            .iter()
            .map(|s| s.unwrap_or(placeholder) as char)
            .collect()
    }
}

impl std::fmt::Debug for AssignmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AssignmentState({:?})", self.render(b'_'))
    }
}

/// Iterator over set bits of a free-slot mask, lowest first.
#[derive(Debug, Clone, Copy)]
pub struct FreeSlots(u64);

impl Iterator for FreeSlots {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let slot = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for FreeSlots {}
