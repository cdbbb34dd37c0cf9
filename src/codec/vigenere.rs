// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Static Vigenère encode and decode over an arbitrary alphabet.

use super::{combine, uncombine};
use crate::alphabet::Alphabet;
use crate::error::{Result, SearchError};

/// How the key stream continues past the end of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Reuse the key cyclically.
    #[default]
    Repeating,
    /// Continue the key with the plaintext itself.
    Autokey,
}

fn key_indices(key: &[u8], alphabet: &Alphabet) -> Result<Vec<u8>> {
    if key.is_empty() {
        return Err(SearchError::EmptyKey("Vigenère"));
    }
    alphabet.check_members(key, "key")?;
    Ok(key.iter().filter_map(|&k| alphabet.index_of(k)).collect())
}

/// Encrypt `plaintext` under `key`.
pub fn encode(plaintext: &[u8], key: &[u8], alphabet: &Alphabet, mode: KeyMode) -> Result<Vec<u8>> {
    let key = key_indices(key, alphabet)?;
    alphabet.check_members(plaintext, "plaintext")?;
    let n = alphabet.modulus();
    let source: Vec<u8> = plaintext.iter().filter_map(|&p| alphabet.index_of(p)).collect();

    let out = source
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let k = match mode {
                KeyMode::Repeating => key[i % key.len()],
                KeyMode::Autokey if i < key.len() => key[i],
                KeyMode::Autokey => source[i - key.len()],
            };
            alphabet.symbol(combine(p, k, n))
        })
        .collect();
    Ok(out)
}

/// Decrypt `ciphertext` under `key`.
pub fn decode(ciphertext: &[u8], key: &[u8], alphabet: &Alphabet, mode: KeyMode) -> Result<Vec<u8>> {
    let key = key_indices(key, alphabet)?;
    alphabet.check_members(ciphertext, "ciphertext")?;
    let n = alphabet.modulus();

    let mut decoded: Vec<u8> = Vec::with_capacity(ciphertext.len());
    for (i, &c) in ciphertext.iter().enumerate() {
        let c = alphabet.index_of(c).unwrap_or(0);
        let k = match mode {
            KeyMode::Repeating => key[i % key.len()],
            KeyMode::Autokey if i < key.len() => key[i],
            KeyMode::Autokey => decoded[i - key.len()],
        };
        decoded.push(uncombine(c, k, n));
    }
    Ok(decoded.into_iter().map(|i| alphabet.symbol(i)).collect())
}
