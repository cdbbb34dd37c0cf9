// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Integration tests for the trail-based backtracking system.
//!
//! These tests verify that the trail system works correctly when integrated
//! with SearchContext, demonstrating the core backtracking behavior that
//! the search engine depends on.

use vigenere_search::state::Cursor;
use vigenere_search::SearchContext;

fn context() -> SearchContext {
    SearchContext::with_ciphertext(b"SGVsbG8g".to_vec(), 64, 4, 6)
}

#[test]
fn test_search_context_simple_backtracking() {
    let mut ctx = context();

    // Initial state
    assert_eq!(ctx.assignment().symbol_at(0), None);

    // Checkpoint and modify using trailed mutators
    let checkpoint = ctx.trail.checkpoint();
    ctx.allocate(0, b'Q');

    assert_eq!(ctx.assignment().symbol_at(0), Some(b'Q'));
    assert_eq!(ctx.trail.len(), 1);

    // Rewind restores the old state
    ctx.rewind_to(checkpoint);
    assert_eq!(ctx.assignment().symbol_at(0), None);
    assert_eq!(ctx.assignment().slot_of(b'Q'), None);
    assert_eq!(ctx.trail.len(), 0);
}

#[test]
fn test_search_context_backtracking() {
    let mut ctx = context();

    // Create checkpoint
    let cp1 = ctx.trail.checkpoint();
    assert_eq!(cp1, 0);

    // Make some changes
    ctx.allocate(5, b'a');
    ctx.push_key(b'K');
    ctx.write_output(0, b'H');

    assert_eq!(ctx.trail.len(), 3);

    // Nested checkpoint
    let cp2 = ctx.trail.checkpoint();
    assert_eq!(cp2, 3);

    ctx.write_output(0, b'J');
    ctx.set_cursor(Cursor::default().advance(1));
    assert_eq!(ctx.trail.len(), 5);

    // Rewind to cp2
    ctx.rewind_to(cp2);
    assert_eq!(ctx.output()[0], b'H'); // Restored!
    assert_eq!(ctx.cursor(), Cursor::default());
    assert_eq!(ctx.trail.len(), 3);

    // Rewind to cp1
    ctx.rewind_to(cp1);
    assert_eq!(ctx.output()[0], 0); // Restored to initial!
    assert!(ctx.key().is_empty());
    assert_eq!(ctx.assignment().free_count(), 64);
    assert_eq!(ctx.trail.len(), 0);
}

#[test]
fn test_independent_search_contexts() {
    // Each parallel worker owns a context; they must not share state.
    let mut ctx1 = context();
    let mut ctx2 = ctx1.clone();

    let cp1 = ctx1.trail.checkpoint();
    ctx1.allocate(0, b'x');
    assert_eq!(ctx1.trail.len(), 1);

    // ctx2 should be completely unaffected
    assert_eq!(ctx2.assignment().symbol_at(0), None);
    assert_eq!(ctx2.trail.len(), 0);

    ctx2.allocate(0, b'y');

    // Both contexts have their own independent state
    assert_eq!(ctx1.assignment().symbol_at(0), Some(b'x'));
    assert_eq!(ctx2.assignment().symbol_at(0), Some(b'y'));

    // Rewind ctx1 doesn't affect ctx2
    ctx1.rewind_to(cp1);
    assert_eq!(ctx1.assignment().symbol_at(0), None);
    assert_eq!(ctx2.assignment().symbol_at(0), Some(b'y')); // Still has its value
    assert_eq!(ctx2.trail.len(), 1); // Still has its trail entry
}

#[test]
fn test_trail_freeze() {
    let mut ctx = context();

    // Cribs are applied, then frozen
    let cp1 = ctx.trail.checkpoint();
    ctx.push_key(b'C');
    ctx.trail.freeze();

    // Make more changes after freeze
    let cp2 = ctx.trail.checkpoint();
    ctx.push_key(b'D');

    // Can rewind to cp2 (recent changes)
    ctx.rewind_to(cp2);
    assert_eq!(ctx.key().as_slice(), b"C");
    assert_eq!(ctx.trail.len(), 1);

    // Cannot rewind past freeze point
    ctx.rewind_to(cp1);
    assert_eq!(ctx.key().as_slice(), b"C"); // Still there (blocked by freeze)
    assert_eq!(ctx.trail.len(), 1);
}

#[test]
fn test_deep_nesting() {
    let mut ctx = context();
    let symbols = b"ABCDEFGH";

    // One nested checkpoint per allocation
    let mut checkpoints = Vec::new();
    for (slot, &symbol) in symbols.iter().enumerate() {
        checkpoints.push(ctx.trail.checkpoint());
        ctx.allocate(slot as u8, symbol);
    }
    assert_eq!(ctx.trail.len(), symbols.len());

    // Rewind all the way back, checking the bijection at each level
    for i in (0..symbols.len()).rev() {
        ctx.rewind_to(checkpoints[i]);
        assert!(ctx.assignment().is_consistent());
        assert_eq!(ctx.assignment().free_count(), 64 - i);
        assert_eq!(ctx.assignment().slot_of(symbols[i]), None);
    }

    assert_eq!(ctx.trail.len(), 0);
}

#[test]
fn test_trying_repeat_is_trailed() {
    let mut ctx = context();
    ctx.push_key(b'K');
    let cp = ctx.trail.checkpoint();

    ctx.set_trying_repeat(true);
    assert!(!ctx.key().can_grow());
    assert_eq!(ctx.key().char_for(5), Some(b'K'));

    ctx.rewind_to(cp);
    assert!(ctx.key().can_grow());
    assert!(!ctx.key().trying_repeat());
}
