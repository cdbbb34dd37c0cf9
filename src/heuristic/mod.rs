// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Plausibility tests for decoded output.
//!
//! A [`Plausibility`] decides whether a byte, or a completed run of bytes,
//! could belong to the plaintext. The driver never calls `accepts` directly
//! on its hot path: the predicate is compiled once into a [`ByteClass`],
//! which also answers the partial-byte question "could any completion of
//! these high bits be accepted?".

use std::fmt::Debug;

/// Lowest printable ASCII byte (space).
pub const PRINTABLE_LOW: u8 = 0x20;
/// Upper bound of printable ASCII (`~`).
pub const PRINTABLE_HIGH_STRICT: u8 = 0x7E;
/// Older upper bound (`z`), which excluded `{|}~`.
pub const PRINTABLE_HIGH_LEGACY: u8 = 0x7A;

/// Letters, digits, space, line breaks and common punctuation.
pub const COMMON_TEXT: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890!.,:@()\"'/\n\r ";

/// Test over a single byte and over a finished run of bytes.
pub trait Plausibility: Debug + Send + Sync {
    fn accepts(&self, byte: u8) -> bool;

    /// Test a completed output group. Every byte has already passed `accepts`.
    fn accepts_run(&self, run: &[u8]) -> bool {
        run.iter().all(|&b| self.accepts(b))
    }
}

/// Bytes in `low..=high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Printable {
    pub low: u8,
    pub high: u8,
}

impl Printable {
    pub const STRICT: Printable = Printable {
        low: PRINTABLE_LOW,
        high: PRINTABLE_HIGH_STRICT,
    };
    pub const LEGACY: Printable = Printable {
        low: PRINTABLE_LOW,
        high: PRINTABLE_HIGH_LEGACY,
    };
}

impl Default for Printable {
    fn default() -> Self {
        Self::STRICT
    }
}

impl Plausibility for Printable {
    fn accepts(&self, byte: u8) -> bool {
        (self.low..=self.high).contains(&byte)
    }
}

/// The bytes of [`COMMON_TEXT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonText;

impl Plausibility for CommonText {
    fn accepts(&self, byte: u8) -> bool {
        COMMON_TEXT.contains(&byte)
    }
}

/// Any byte from an explicit set.
#[derive(Clone, PartialEq, Eq)]
pub struct Membership {
    members: [bool; 256],
}

impl Membership {
    pub fn new(bytes: &[u8]) -> Self {
        let mut members = [false; 256];
        for &b in bytes {
            members[b as usize] = true;
        }
        Self { members }
    }
}

impl Debug for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes: Vec<u8> = (0..=255u8).filter(|&b| self.members[b as usize]).collect();
        write!(f, "Membership({:?})", String::from_utf8_lossy(&bytes))
    }
}

impl Plausibility for Membership {
    fn accepts(&self, byte: u8) -> bool {
        self.members[byte as usize]
    }
}

/// Every byte. Useful for counting the raw search space.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Plausibility for AcceptAll {
    fn accepts(&self, _byte: u8) -> bool {
        true
    }
}

/// A plausibility test flattened into lookup tables.
///
/// `prefix[k][b]` is true when some byte whose top `k` bits equal those of
/// `b` is accepted. `prefix[8]` is the plain acceptance table and
/// `prefix[0][_]` says whether anything is accepted at all.
#[derive(Clone)]
pub struct ByteClass {
    prefix: [[bool; 256]; 9],
}

impl ByteClass {
    pub fn compile(test: &dyn Plausibility) -> Self {
        let mut prefix = [[false; 256]; 9];
        for b in 0..=255u8 {
            prefix[8][b as usize] = test.accepts(b);
        }
        for known in (0..8).rev() {
            let free = 8 - known;
            let span = 1usize << free;
            for start in (0..256).step_by(span) {
                let any = prefix[8][start..start + span].iter().any(|&ok| ok);
                prefix[known][start..start + span].fill(any);
            }
        }
        Self { prefix }
    }

    #[inline]
    pub fn accepts(&self, byte: u8) -> bool {
        self.prefix[8][byte as usize]
    }

    /// Whether some completion of the top `known_bits` bits of `partial` is accepted.
    ///
    /// The unknown low bits of `partial` are ignored.
    #[inline]
    pub fn admits_prefix(&self, partial: u8, known_bits: u32) -> bool {
        debug_assert!(known_bits <= 8);
        self.prefix[known_bits as usize][partial as usize]
    }

    /// Whether any byte at all is accepted.
    pub fn is_satisfiable(&self) -> bool {
        self.prefix[0][0]
    }
}

impl Debug for ByteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let accepted = self.prefix[8].iter().filter(|&&ok| ok).count();
        write!(f, "ByteClass({accepted} bytes)")
    }
}

/// Shannon entropy of `bytes` in bits per byte; zero for an empty run.
pub fn shannon_entropy(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let mut counts = [0usize; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }
    let len = bytes.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_bounds() {
        assert!(Printable::STRICT.accepts(b' '));
        assert!(Printable::STRICT.accepts(b'~'));
        assert!(!Printable::STRICT.accepts(0x7F));
        assert!(!Printable::STRICT.accepts(b'\n'));
        assert!(Printable::LEGACY.accepts(b'z'));
        assert!(!Printable::LEGACY.accepts(b'{'));
    }

    #[test]
    fn test_common_text() {
        for &b in b"Hello, World! (see /tmp)\r\n" {
            assert!(CommonText.accepts(b), "{:?}", b as char);
        }
        assert!(!CommonText.accepts(b'#'));
        assert!(!CommonText.accepts(b'~'));
    }

    #[test]
    fn test_membership() {
        let digits = Membership::new(b"0123456789 ");
        assert!(digits.accepts(b'7'));
        assert!(!digits.accepts(b'a'));
        assert!(digits.accepts_run(b"12 34"));
    }

    #[test]
    fn test_byte_class_matches_test() {
        let class = ByteClass::compile(&CommonText);
        for b in 0..=255u8 {
            assert_eq!(class.accepts(b), CommonText.accepts(b));
        }
    }

    #[test]
    fn test_admits_prefix_is_exact() {
        // A prefix is admitted iff one of its completions is accepted.
        let tests: [&dyn Plausibility; 4] = [
            &Printable::STRICT,
            &Printable::LEGACY,
            &CommonText,
            &Membership::new(b"\x00\xffQ"),
        ];
        for test in tests {
            let class = ByteClass::compile(test);
            for known in 0..=8u32 {
                let free = 8 - known;
                for b in 0..=255u8 {
                    let start = (b as u16 >> free) << free;
                    let any = (start..start + (1 << free)).any(|c| test.accepts(c as u8));
                    assert_eq!(class.admits_prefix(b, known), any, "{test:?} {b:#x}/{known}");
                }
            }
        }
    }

    #[test]
    fn test_high_bit_prefix_rejected_for_ascii() {
        let class = ByteClass::compile(&Printable::STRICT);
        assert!(!class.admits_prefix(0x80, 1));
        assert!(!class.admits_prefix(0xC0, 2));
        assert!(class.admits_prefix(0x40, 2));
        // 0b0001_xxxx holds no printable byte
        assert!(!class.admits_prefix(0x10, 4));
    }

    #[test]
    fn test_unsatisfiable_class() {
        assert!(!ByteClass::compile(&Membership::new(b"")).is_satisfiable());
        assert!(ByteClass::compile(&AcceptAll).is_satisfiable());
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(b""), 0.0);
        assert_eq!(shannon_entropy(b"aaaa"), 0.0);
        assert!((shannon_entropy(b"abab") - 1.0).abs() < 1e-12);
        assert!((shannon_entropy(b"abcd") - 2.0).abs() < 1e-12);
    }
}
