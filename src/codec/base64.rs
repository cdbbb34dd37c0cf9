// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Static Base64 over an arbitrary 64-symbol alphabet.
//!
//! Encoding pads with `=`; decoding accepts padded or unpadded input and
//! decodes a trailing group of two or three symbols into one or two bytes.

use super::{pack, unpack};
use crate::alphabet::Alphabet;
use crate::error::{Result, SearchError};

/// Padding symbol appended by [`encode`] and stripped by [`decode`].
pub const PAD: u8 = b'=';

fn require_base64(alphabet: &Alphabet) -> Result<()> {
    if alphabet.len() != 64 {
        return Err(SearchError::NotBase64(alphabet.len()));
    }
    Ok(())
}

/// Remove up to two trailing padding symbols.
pub fn strip_padding(text: &[u8]) -> &[u8] {
    let mut end = text.len();
    while end > 0 && text.len() - end < 2 && text[end - 1] == PAD {
        end -= 1;
    }
    &text[..end]
}

/// Number of bytes decoded from `symbols` unpadded Base64 symbols.
///
/// Returns `None` for a length that leaves a single dangling symbol.
pub fn decoded_len(symbols: usize) -> Option<usize> {
    match symbols % 4 {
        1 => None,
        0 => Some(symbols / 4 * 3),
        tail => Some(symbols / 4 * 3 + tail - 1),
    }
}

/// Encode `bytes` with `alphabet`, padding the final group with `=`.
pub fn encode(bytes: &[u8], alphabet: &Alphabet) -> Result<Vec<u8>> {
    require_base64(alphabet)?;
    let mut out = Vec::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let mut group = [0u8; 3];
        group[..chunk.len()].copy_from_slice(chunk);
        let sextets = pack(group);
        for &sextet in &sextets[..chunk.len() + 1] {
            out.push(alphabet.symbol(sextet));
        }
        for _ in chunk.len()..3 {
            out.push(PAD);
        }
    }
    Ok(out)
}

/// Decode `text` with `alphabet`.
pub fn decode(text: &[u8], alphabet: &Alphabet) -> Result<Vec<u8>> {
    require_base64(alphabet)?;
    let text = strip_padding(text);
    let len = decoded_len(text.len()).ok_or(SearchError::DanglingSymbol(text.len()))?;
    alphabet.check_members(text, "Base64 text")?;

    let mut out = Vec::with_capacity(len);
    for group in text.chunks(4) {
        let mut sextets = [0u8; 4];
        for (sextet, &symbol) in sextets.iter_mut().zip(group) {
            // Membership was checked above.
            *sextet = alphabet.index_of(symbol).unwrap_or(0);
        }
        let bytes = unpack(sextets[0], sextets[1], sextets[2], sextets[3]);
        out.extend_from_slice(&bytes[..group.len() - 1]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hello_worldd() {
        let decoded = decode(b"SGVsbG8gV29ybGRk", &Alphabet::base64()).unwrap();
        assert_eq!(decoded, b"Hello Worldd");
    }

    #[test]
    fn test_encode_padding() {
        let alphabet = Alphabet::base64();
        assert_eq!(encode(b"M", &alphabet).unwrap(), b"TQ==");
        assert_eq!(encode(b"Ma", &alphabet).unwrap(), b"TWE=");
        assert_eq!(encode(b"Man", &alphabet).unwrap(), b"TWFu");
        assert_eq!(encode(b"", &alphabet).unwrap(), b"");
    }

    #[test]
    fn test_decode_tail_groups() {
        let alphabet = Alphabet::base64();
        assert_eq!(decode(b"TQ==", &alphabet).unwrap(), b"M");
        assert_eq!(decode(b"TWE", &alphabet).unwrap(), b"Ma");
    }

    #[test]
    fn test_decode_rejects_dangling_symbol() {
        assert_eq!(
            decode(b"TWFuT", &Alphabet::base64()),
            Err(SearchError::DanglingSymbol(5))
        );
    }

    #[test]
    fn test_decode_rejects_foreign_symbol() {
        assert!(matches!(
            decode(b"TW-u", &Alphabet::base64()),
            Err(SearchError::UnknownSymbol { position: 2, .. })
        ));
    }

    #[test]
    fn test_requires_64_symbols() {
        let small = Alphabet::latin_upper();
        assert_eq!(encode(b"x", &small), Err(SearchError::NotBase64(26)));
    }

    #[test]
    fn test_strip_padding_stops_after_two() {
        assert_eq!(strip_padding(b"TQ==="), b"TQ=");
        assert_eq!(strip_padding(b"===="), b"==");
    }

    #[test]
    fn test_decoded_len() {
        assert_eq!(decoded_len(0), Some(0));
        assert_eq!(decoded_len(4), Some(3));
        assert_eq!(decoded_len(6), Some(4));
        assert_eq!(decoded_len(7), Some(5));
        assert_eq!(decoded_len(5), None);
    }
}
