// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! What is unknown, and how one ciphertext symbol is resolved.
//!
//! Each [`Unknown`] variant turns a ciphertext symbol into a plaintext
//! symbol through a fixed number of resolution stages. A stage either is
//! already determined by the current assignment and key, or produces a list
//! of [`Choice`]s for the engine to branch over. After a choice is applied
//! the same stage is evaluated again, and now resolves.
//!
//! | Variant | Stages | Branches over |
//! |---|---|---|
//! | `SubstitutionAlphabet` | 1 | plaintext symbol of the ciphertext slot |
//! | `VigenereAlphabet` | 3 | slot of the key symbol, slot of the ciphertext symbol, symbol of the difference slot |
//! | `VigenereKey` | 1 | next key symbol, or freezing the key |
//! | `DoubleVigenereKey` | 1 | next unknown key symbol, or freezing it |

pub mod config;
pub mod rotate;

pub use config::{Crib, PreparedSearch, SearchConfig, SearchReport, MAX_KEY_LEN};
pub use rotate::{rotated, rotations, Rotation};

use crate::alphabet::Alphabet;
use crate::codec::{combine, uncombine};
use crate::context::SearchContext;
use crate::state::{AssignmentState, Cursor, KeyBuffer, Resolution};

/// How decoded symbols become output bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// Each symbol is a Base64 sextet; four symbols make three bytes.
    #[default]
    Base64,
    /// Each symbol is an output byte.
    Direct,
}

/// Which Vigenère layer was stripped first when decoding a double encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerOrder {
    /// Decode with the known key, then with the unknown key.
    #[default]
    KnownFirst,
    /// Decode with the unknown key, then with the known key.
    UnknownFirst,
}

/// The unknown part of the cipher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unknown {
    /// A monoalphabetic substitution: slot `i` holds the plaintext symbol
    /// for the `i`th symbol of the cipher alphabet.
    SubstitutionAlphabet,
    /// The tableau alphabet of a Vigenère cipher with a known repeating key.
    VigenereAlphabet { key: Vec<u8> },
    /// A repeating key over a known tableau, of unknown length up to `max_key_len`.
    VigenereKey {
        key_alphabet: Alphabet,
        max_key_len: usize,
    },
    /// A second, unknown repeating key layered with a known one.
    ///
    /// The known layer uses `known_alphabet` as its tableau, or the cipher
    /// alphabet when `None`.
    DoubleVigenereKey {
        known_key: Vec<u8>,
        known_alphabet: Option<Alphabet>,
        order: LayerOrder,
        key_alphabet: Alphabet,
        max_key_len: usize,
    },
}

impl Unknown {
    pub fn name(&self) -> &'static str {
        match self {
            Unknown::SubstitutionAlphabet => "substitution alphabet",
            Unknown::VigenereAlphabet { .. } => "Vigenère alphabet",
            Unknown::VigenereKey { .. } => "Vigenère key",
            Unknown::DoubleVigenereKey { .. } => "double Vigenère key",
        }
    }

    /// Resolution stages per ciphertext symbol.
    pub fn stages(&self) -> usize {
        match self {
            Unknown::VigenereAlphabet { .. } => 3,
            _ => 1,
        }
    }

    /// Whether solutions carry an alphabet.
    pub fn searches_alphabet(&self) -> bool {
        matches!(
            self,
            Unknown::SubstitutionAlphabet | Unknown::VigenereAlphabet { .. }
        )
    }

    /// Whether solutions carry a key.
    pub fn searches_key(&self) -> bool {
        !self.searches_alphabet()
    }

    /// Bound on the recovered key, zero when no key is searched.
    pub fn max_key_len(&self) -> usize {
        match self {
            Unknown::VigenereKey { max_key_len, .. }
            | Unknown::DoubleVigenereKey { max_key_len, .. } => *max_key_len,
            _ => 0,
        }
    }

    /// Symbols the recovered key may use.
    pub fn key_alphabet(&self) -> Option<&Alphabet> {
        match self {
            Unknown::VigenereKey { key_alphabet, .. }
            | Unknown::DoubleVigenereKey { key_alphabet, .. } => Some(key_alphabet),
            _ => None,
        }
    }
}

/// One way to continue from a branch point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Allocate { slot: u8, symbol: u8 },
    ExtendKey(u8),
    FreezeKey,
}

/// Outcome of evaluating one resolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// This stage is determined; go on to the next.
    Resolved,
    /// The choice buffer holds the alternatives. Empty means a dead end.
    Branch,
    /// The plaintext symbol of the current ciphertext symbol.
    Emit(u8),
    /// The symbol cannot be decoded under the current state.
    Dead,
}

/// Decodes one ciphertext symbol at a time for an [`Unknown`] variant.
#[derive(Debug, Clone)]
pub struct Resolver {
    alphabet: Alphabet,
    unknown: Unknown,
}

/// One Vigenère decode step over `alphabet`, by symbol.
fn strip_layer(alphabet: &Alphabet, symbol: u8, key: u8) -> Option<u8> {
    let n = alphabet.modulus();
    let i = uncombine(alphabet.index_of(symbol)?, alphabet.index_of(key)?, n);
    Some(alphabet.symbol(i))
}

/// One Vigenère encode step over `alphabet`, by symbol.
fn add_layer(alphabet: &Alphabet, symbol: u8, key: u8) -> Option<u8> {
    let n = alphabet.modulus();
    let i = combine(alphabet.index_of(symbol)?, alphabet.index_of(key)?, n);
    Some(alphabet.symbol(i))
}

/// The key symbol for `pos`, or fill `choices` when the key must grow here.
fn key_symbol(key: &KeyBuffer, pos: usize, key_alphabet: &Alphabet, choices: &mut Vec<Choice>) -> Option<u8> {
    if pos < key.len() {
        return key.char_for(pos);
    }
    if key.can_grow() {
        debug_assert_eq!(pos, key.len(), "Key grows in lock step with the ciphertext");
        choices.extend(key_alphabet.as_bytes().iter().map(|&s| Choice::ExtendKey(s)));
        if !key.is_empty() {
            choices.push(Choice::FreezeKey);
        }
        return None;
    }
    key.char_for(pos)
}

impl Resolver {
    pub fn new(alphabet: Alphabet, unknown: Unknown) -> Self {
        Self { alphabet, unknown }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn unknown(&self) -> &Unknown {
        &self.unknown
    }

    fn known_alphabet(&self) -> &Alphabet {
        match &self.unknown {
            Unknown::DoubleVigenereKey {
                known_alphabet: Some(known),
                ..
            } => known,
            _ => &self.alphabet,
        }
    }

    /// Evaluate the current stage of the symbol under `cursor`.
    ///
    /// `choices` is cleared first and filled only for [`Step::Branch`].
    pub fn resolve(&self, ctx: &SearchContext, cursor: Cursor, choices: &mut Vec<Choice>) -> Step {
        choices.clear();
        let pos = cursor.ciphertext_index;
        let c = ctx.ciphertext()[pos];
        let assignment = ctx.assignment();
        let n = self.alphabet.modulus();

        match &self.unknown {
            Unknown::SubstitutionAlphabet => {
                let Some(slot) = self.alphabet.index_of(c) else {
                    return Step::Dead;
                };
                self.emit_or_branch(assignment, slot, choices)
            }
            Unknown::VigenereAlphabet { key } => {
                let k = key[pos % key.len()];
                let bind = |symbol: u8, choices: &mut Vec<Choice>| match assignment.lookup_slot(symbol) {
                    Resolution::Bound(_) => Step::Resolved,
                    Resolution::Branch(slots) => {
                        choices.extend(slots.map(|slot| Choice::Allocate { slot, symbol }));
                        Step::Branch
                    }
                };
                match cursor.stage {
                    0 => bind(k, choices),
                    1 => bind(c, choices),
                    _ => {
                        let (Some(slot_c), Some(slot_k)) = (assignment.slot_of(c), assignment.slot_of(k)) else {
                            return Step::Dead;
                        };
                        self.emit_or_branch(assignment, uncombine(slot_c, slot_k, n), choices)
                    }
                }
            }
            Unknown::VigenereKey { key_alphabet, .. } => {
                match key_symbol(ctx.key(), pos, key_alphabet, choices) {
                    Some(k) => strip_layer(&self.alphabet, c, k).map_or(Step::Dead, Step::Emit),
                    None => Step::Branch,
                }
            }
            Unknown::DoubleVigenereKey {
                known_key,
                order,
                key_alphabet,
                ..
            } => {
                let Some(unknown_k) = key_symbol(ctx.key(), pos, key_alphabet, choices) else {
                    return Step::Branch;
                };
                let known_k = known_key[pos % known_key.len()];
                let known = self.known_alphabet();
                let plain = match order {
                    LayerOrder::KnownFirst => strip_layer(known, c, known_k)
                        .and_then(|x| strip_layer(&self.alphabet, x, unknown_k)),
                    LayerOrder::UnknownFirst => strip_layer(&self.alphabet, c, unknown_k)
                        .and_then(|x| strip_layer(known, x, known_k)),
                };
                plain.map_or(Step::Dead, Step::Emit)
            }
        }
    }

    /// Emit the symbol at `slot`, or branch over the symbols it could hold.
    fn emit_or_branch(&self, assignment: &AssignmentState, slot: u8, choices: &mut Vec<Choice>) -> Step {
        match assignment.lookup_symbol(slot, &self.alphabet) {
            Resolution::Bound(symbol) => Step::Emit(symbol),
            Resolution::Branch(symbols) => {
                choices.extend(symbols.map(|symbol| Choice::Allocate { slot, symbol }));
                Step::Branch
            }
        }
    }

    /// Apply a choice through the context's trailed mutators.
    pub fn apply(ctx: &mut SearchContext, choice: Choice) {
        match choice {
            Choice::Allocate { slot, symbol } => ctx.allocate(slot, symbol),
            Choice::ExtendKey(symbol) => ctx.push_key(symbol),
            Choice::FreezeKey => ctx.set_trying_repeat(true),
        }
    }

    /// The unknown key symbol that decodes ciphertext `c` at `pos` to `plain`.
    ///
    /// `None` for variants without a key, or when a symbol is foreign to
    /// the alphabet it must be looked up in.
    pub fn key_for_plain(&self, c: u8, plain: u8, pos: usize) -> Option<u8> {
        let a = &self.alphabet;
        let n = a.modulus();
        match &self.unknown {
            Unknown::VigenereKey { .. } => {
                Some(a.symbol(uncombine(a.index_of(c)?, a.index_of(plain)?, n)))
            }
            Unknown::DoubleVigenereKey {
                known_key, order, ..
            } => {
                let known_k = known_key[pos % known_key.len()];
                let known = self.known_alphabet();
                match order {
                    LayerOrder::KnownFirst => {
                        let x = strip_layer(known, c, known_k)?;
                        Some(a.symbol(uncombine(a.index_of(x)?, a.index_of(plain)?, n)))
                    }
                    LayerOrder::UnknownFirst => {
                        let x = add_layer(known, plain, known_k)?;
                        Some(a.symbol(uncombine(a.index_of(c)?, a.index_of(x)?, n)))
                    }
                }
            }
            _ => None,
        }
    }
}
