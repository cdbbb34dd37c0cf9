// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search context: the ciphertext plus all mutable search state.
//!
//! The ciphertext is read-only for the whole search. Everything else
//! (assignment, key, cursor, output buffer) is changed only through the
//! trailed mutators below, so rewinding the trail restores it exactly.
//! Each parallel worker owns its own context.

use crate::state::{AssignmentState, Cursor, KeyBuffer, Statistics};
use crate::trail::{Trail, Undo};

/// Search context passed by `&mut` through the engine.
///
/// ```text
/// SearchContext {
///     ciphertext: Vec<u8>,         // immutable
///     trail: Trail,                // undo records
///     assignment, key, cursor,     // trailed
///     output: Vec<u8>,             // trailed, fixed size
///     statistics: Statistics,      // counters, never rewound
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SearchContext {
    ciphertext: Vec<u8>,
    /// Trail for O(1) backtracking
    pub trail: Trail,
    assignment: AssignmentState,
    key: KeyBuffer,
    cursor: Cursor,
    output: Vec<u8>,
    /// Counters; these survive backtracking.
    pub statistics: Statistics,
}

/// Everything a rewind must restore, for equality checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub assignment: AssignmentState,
    pub key: KeyBuffer,
    pub cursor: Cursor,
    pub output: Vec<u8>,
    pub trail_len: usize,
}

impl SearchContext {
    /// An empty context over a 64-slot alphabet, with no ciphertext.
    pub fn new() -> Self {
        Self::with_ciphertext(Vec::new(), crate::alphabet::MAX_ALPHABET_SIZE, 0, 0)
    }

    /// A fresh context for one search.
    pub fn with_ciphertext(
        ciphertext: Vec<u8>,
        alphabet_size: usize,
        max_key_len: usize,
        output_len: usize,
    ) -> Self {
        Self {
            ciphertext,
            trail: Trail::new(),
            assignment: AssignmentState::new(alphabet_size),
            key: KeyBuffer::new(max_key_len),
            cursor: Cursor::default(),
            output: vec![0; output_len],
            statistics: Statistics::new(),
        }
    }

    /// Replace the trail of a fresh context with one bounded by `limit`.
    pub fn with_trail_limit(mut self, limit: usize) -> Self {
        self.trail = Trail::with_limit(limit);
        self
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn assignment(&self) -> &AssignmentState {
        &self.assignment
    }

    pub fn key(&self) -> &KeyBuffer {
        &self.key
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// The output committed so far.
    pub fn plaintext(&self) -> &[u8] {
        &self.output[..self.cursor.plaintext_index]
    }

    // Trailed mutators

    pub fn allocate(&mut self, slot: u8, symbol: u8) {
        self.assignment.allocate(slot, symbol);
        self.trail.record(Undo::Deallocate { slot });
    }

    pub fn push_key(&mut self, symbol: u8) {
        self.key.push(symbol);
        self.trail.record(Undo::PopKey);
    }

    pub fn set_trying_repeat(&mut self, trying_repeat: bool) {
        let old = self.key.set_trying_repeat(trying_repeat);
        if old != trying_repeat {
            self.trail.record(Undo::TryingRepeat(old));
        }
    }

    pub fn write_output(&mut self, index: usize, byte: u8) {
        let old = std::mem::replace(&mut self.output[index], byte);
        if old != byte {
            self.trail.record(Undo::Output { index, old });
        }
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        let old = std::mem::replace(&mut self.cursor, cursor);
        self.trail.record(Undo::Cursor(old));
    }

    /// Undo every change recorded above `checkpoint`, newest first.
    ///
    /// Stops at the frozen prefix of the trail.
    pub fn rewind_to(&mut self, checkpoint: usize) {
        while let Some(undo) = self.trail.pop_above(checkpoint) {
            match undo {
                Undo::Deallocate { slot } => {
                    self.assignment.deallocate(slot);
                }
                Undo::PopKey => {
                    self.key.pop();
                }
                Undo::TryingRepeat(old) => {
                    self.key.set_trying_repeat(old);
                }
                Undo::Output { index, old } => self.output[index] = old,
                Undo::Cursor(old) => self.cursor = old,
            }
        }
    }

    /// Capture the rewindable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            assignment: self.assignment.clone(),
            key: self.key.clone(),
            cursor: self.cursor,
            output: self.output.clone(),
            trail_len: self.trail.len(),
        }
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}
