// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The partially recovered key and the driver's read position.

/// A key that grows one symbol per ciphertext position until it is frozen
/// or reaches its bound, after which it is reused cyclically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyBuffer {
    chars: Vec<u8>,
    max_len: usize,
    trying_repeat: bool,
}

impl KeyBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            chars: Vec::with_capacity(max_len),
            max_len,
            trying_repeat: false,
        }
    }

    /// Append `symbol`.
    ///
    /// # Panics
    ///
    /// Panics when the key is full or frozen.
    pub fn push(&mut self, symbol: u8) {
        assert!(self.can_grow(), "Key buffer cannot grow past {:?}", self);
        self.chars.push(symbol);
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.chars.pop()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.chars
    }

    pub fn trying_repeat(&self) -> bool {
        self.trying_repeat
    }

    /// Set the freeze flag, returning the previous value.
    pub fn set_trying_repeat(&mut self, trying_repeat: bool) -> bool {
        std::mem::replace(&mut self.trying_repeat, trying_repeat)
    }

    /// Whether a new symbol may still be appended.
    pub fn can_grow(&self) -> bool {
        !self.trying_repeat && self.chars.len() < self.max_len
    }

    /// Key symbol governing ciphertext position `pos`, if already known.
    ///
    /// Positions past the end use the key cyclically, which is only
    /// meaningful once the key has stopped growing.
    pub fn char_for(&self, pos: usize) -> Option<u8> {
        match self.chars.len() {
            0 => None,
            len if pos < len => Some(self.chars[pos]),
            len => Some(self.chars[pos % len]),
        }
    }
}

/// Where the driver is: next ciphertext symbol, start of the current output
/// group, and how many resolution stages of the current symbol are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub ciphertext_index: usize,
    pub plaintext_index: usize,
    pub stage: u8,
}

impl Cursor {
    /// Same position, one more stage resolved.
    pub fn next_stage(self) -> Self {
        Self {
            stage: self.stage + 1,
            ..self
        }
    }

    /// Start of the next ciphertext symbol.
    pub fn advance(self, produced: usize) -> Self {
        Self {
            ciphertext_index: self.ciphertext_index + 1,
            plaintext_index: self.plaintext_index + produced,
            stage: 0,
        }
    }
}
