// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Trail-based backtracking for the decode search.
//!
//! Every change to the search state pushes a typed undo record. Backtracking
//! pops records above a checkpoint and hands them back to the owner of the
//! state (`SearchContext`) to replay in reverse order.
//!
//! The trail never touches the state itself: it only knows how far it may
//! unwind. A frozen prefix (crib bootstrap) is never unwound.

use crate::state::Cursor;

/// How to undo one state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undo {
    /// Release a slot that was allocated.
    Deallocate { slot: u8 },
    /// Remove the last key symbol.
    PopKey,
    /// Restore the key's freeze flag.
    TryingRepeat(bool),
    /// Restore one byte of the output buffer.
    Output { index: usize, old: u8 },
    /// Restore the driver cursor.
    Cursor(Cursor),
}

/// The trail system for O(1) backtracking.
///
/// # Memory Model
///
/// Each SearchContext owns its own trail, so parallel workers never share one.
#[derive(Debug, Clone)]
pub struct Trail {
    entries: Vec<Undo>,
    /// Entries below this index are never unwound.
    frozen: usize,
    limit: usize,
}

impl Trail {
    /// Default bound on outstanding undo records.
    pub const MAX_SIZE: usize = 1 << 20;

    const INITIAL_CAPACITY: usize = 4096;

    /// Create a new empty trail.
    pub fn new() -> Self {
        Self::with_limit(Self::MAX_SIZE)
    }

    /// Create a trail that panics once more than `limit` records are outstanding.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::with_capacity(limit.min(Self::INITIAL_CAPACITY)),
            frozen: 0,
            limit,
        }
    }

    /// The current position, to rewind to later.
    pub fn checkpoint(&self) -> usize {
        self.entries.len()
    }

    /// Record how to undo a change.
    ///
    /// # Panics
    ///
    /// Panics if the trail exceeds its limit (indicates a bug in the search algorithm).
    pub fn record(&mut self, undo: Undo) {
        if self.entries.len() >= self.limit {
            panic!("Trail overflow: exceeded {} entries", self.limit);
        }
        self.entries.push(undo);
    }

    /// Pop the newest record if it lies above both `mark` and the frozen prefix.
    pub fn pop_above(&mut self, mark: usize) -> Option<Undo> {
        if self.entries.len() > mark.max(self.frozen) {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Freeze the trail at the current position.
    ///
    /// After freezing, no backtracking past this point is allowed.
    pub fn freeze(&mut self) {
        self.frozen = self.entries.len();
    }

    /// Most records that may be outstanding at once.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Length of the frozen prefix.
    pub fn frozen_len(&self) -> usize {
        self.frozen
    }

    /// Get the current number of entries in the trail.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_new() {
        let trail = Trail::new();
        assert_eq!(trail.len(), 0);
        assert_eq!(trail.checkpoint(), 0);
        assert!(trail.is_empty());
    }

    #[test]
    fn test_pop_above_returns_newest_first() {
        let mut trail = Trail::new();
        trail.record(Undo::PopKey);
        let mark = trail.checkpoint();
        trail.record(Undo::Deallocate { slot: 3 });
        trail.record(Undo::TryingRepeat(false));

        assert_eq!(trail.pop_above(mark), Some(Undo::TryingRepeat(false)));
        assert_eq!(trail.pop_above(mark), Some(Undo::Deallocate { slot: 3 }));
        assert_eq!(trail.pop_above(mark), None);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_freeze() {
        let mut trail = Trail::new();
        trail.record(Undo::PopKey);
        trail.record(Undo::PopKey);
        trail.freeze();
        trail.record(Undo::Output { index: 0, old: 0 });

        // Can rewind recent changes
        assert!(trail.pop_above(0).is_some());
        // Cannot rewind past freeze point
        assert_eq!(trail.pop_above(0), None);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.frozen_len(), 2);
    }

    #[test]
    #[should_panic(expected = "Trail overflow")]
    fn test_trail_overflow() {
        let mut trail = Trail::with_limit(8);
        for _ in 0..9 {
            trail.record(Undo::PopKey);
        }
    }
}
