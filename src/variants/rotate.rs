// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Rotated tableaux under a known key.
//!
//! A cheap screen that runs before any backtracking: the tableau may be the
//! cipher alphabet shifted by an unknown amount. Every shift is decoded with
//! the static codecs and the plausible decodings are ranked by entropy.

use log::{debug, info};

use crate::alphabet::Alphabet;
use crate::codec::{base64, vigenere};
use crate::error::{Result, SearchError};
use crate::heuristic::{shannon_entropy, Plausibility};

/// `alphabet` shifted so its symbol `j` lands at index `(j + shift) % len`.
pub fn rotated(alphabet: &Alphabet, shift: usize) -> Alphabet {
    let symbols = alphabet.as_bytes();
    let n = symbols.len();
    let shift = shift % n;
    let mut out = vec![0u8; n];
    for (j, &symbol) in symbols.iter().enumerate() {
        out[(j + shift) % n] = symbol;
    }
    // A permutation of a valid alphabet is valid.
    Alphabet::new(&out).unwrap_or_else(|_| alphabet.clone())
}

/// One plausible decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub shift: usize,
    pub plaintext: Vec<u8>,
    pub entropy: f64,
}

/// Decode `ciphertext` under `key` with every rotation of `alphabet`, then
/// Base64 through `encoding`.
///
/// Returns the rotations whose output is plausible, lowest entropy first.
pub fn rotations(
    ciphertext: &[u8],
    key: &[u8],
    alphabet: &Alphabet,
    encoding: &Alphabet,
    plausibility: &dyn Plausibility,
) -> Result<Vec<Rotation>> {
    if !alphabet.same_symbols(encoding) {
        return Err(SearchError::AlphabetMismatch(format!(
            "cipher alphabet {alphabet:?} and Base64 encoding {encoding:?} must hold the same symbols"
        )));
    }
    let ciphertext = base64::strip_padding(ciphertext);
    if ciphertext.len() < 2 {
        return Err(SearchError::CiphertextTooShort {
            len: ciphertext.len(),
            min: 2,
        });
    }

    let mut found = Vec::new();
    for shift in 0..alphabet.len() {
        let tableau = rotated(alphabet, shift);
        let symbols = vigenere::decode(ciphertext, key, &tableau, vigenere::KeyMode::Repeating)?;
        let plaintext = base64::decode(&symbols, encoding)?;
        if plausibility.accepts_run(&plaintext) {
            debug!("Rotation {shift} decodes plausibly");
            let entropy = shannon_entropy(&plaintext);
            found.push(Rotation {
                shift,
                plaintext,
                entropy,
            });
        }
    }
    found.sort_by(|a, b| a.entropy.total_cmp(&b.entropy).then(a.shift.cmp(&b.shift)));
    info!(
        "{} of {} rotations decode plausibly",
        found.len(),
        alphabet.len()
    );
    Ok(found)
}
