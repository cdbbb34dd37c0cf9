// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use vigenere_search::codec::{base64, vigenere};
use vigenere_search::state::AssignmentState;
use vigenere_search::{Alphabet, SearchReport, Solution};

pub use vigenere::KeyMode;

/// Letters only, a typical key alphabet.
pub const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Base64-encode `plain` without padding.
pub fn to_base64(plain: &[u8]) -> Vec<u8> {
    let encoded = base64::encode(plain, &Alphabet::base64()).unwrap();
    base64::strip_padding(&encoded).to_vec()
}

/// Base64-encode `plain`, then Vigenère-encrypt with each key in turn.
pub fn encrypt(plain: &[u8], keys: &[&[u8]], alphabet: &Alphabet) -> Vec<u8> {
    let mut text = to_base64(plain);
    for key in keys {
        text = vigenere::encode(&text, key, alphabet, KeyMode::Repeating).unwrap();
    }
    text
}

/// Replace each symbol of `text` by the symbol at the same index of `to`.
pub fn substitute(text: &[u8], from: &Alphabet, to: &Alphabet) -> Vec<u8> {
    text.iter()
        .map(|&s| to.symbol(from.index_of(s).unwrap()))
        .collect()
}

/// Fill the unreached slots of a solution's alphabet with the unused
/// symbols of `domain`, in domain order.
pub fn complete_alphabet(solution: &Solution, domain: &Alphabet) -> Alphabet {
    let slots = solution.alphabet.as_ref().unwrap();
    let mut unused = domain
        .as_bytes()
        .iter()
        .copied()
        .filter(|s| !slots.contains(&Some(*s)));
    let symbols: Vec<u8> = slots
        .iter()
        .map(|s| s.unwrap_or_else(|| unused.next().unwrap()))
        .collect();
    Alphabet::new(&symbols).unwrap()
}

/// Solutions sorted, for order-independent comparison.
pub fn sorted(report: &SearchReport) -> Vec<Solution> {
    let mut solutions = report.solutions.clone();
    solutions.sort();
    solutions
}

/// Whether some solution decodes to `plain` with key `key`.
pub fn has_key_solution(report: &SearchReport, plain: &[u8], key: &[u8]) -> bool {
    report
        .solutions
        .iter()
        .any(|s| s.plaintext == plain && s.key.as_deref() == Some(key))
}

/// Number of ways to bind each slot of `slots` to a symbol of `domain`,
/// counted by brute force over the assignment state.
pub fn reference_count(state: &mut AssignmentState, slots: &[u8], domain: &Alphabet) -> usize {
    match slots.split_first() {
        None => 1,
        Some((&slot, rest)) => {
            let mut count = 0;
            state.resolve_index_or_branch(slot, domain, |state, _symbol| {
                count += reference_count(state, rest, domain);
            });
            count
        }
    }
}
