// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Mutable search state.
//!
//! Everything here changes during the descent. The types themselves are
//! plain data; `SearchContext` wraps their mutators so each change is
//! recorded on the trail and undone on backtrack.

pub mod assignment;
pub mod key;
pub mod statistics;

pub use assignment::{AssignmentState, FreeSlots, Resolution};
pub use key::{Cursor, KeyBuffer};
pub use statistics::{Counters, Statistics};
