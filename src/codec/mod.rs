// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Codec primitives shared by the static codecs and the search driver.
//!
//! - `combine` / `uncombine`: Vigenère modular addition and subtraction
//! - `unpack` / `pack`: Base64 sextet ⇄ octet expansion
//!
//! The static, whole-buffer codecs live in [`base64`] and [`vigenere`].

pub mod base64;
pub mod vigenere;

/// Vigenère encode step: `(source + key) mod n`.
#[inline]
pub fn combine(source: u8, key: u8, n: u8) -> u8 {
    debug_assert!(source < n && key < n);
    ((source as u16 + key as u16) % n as u16) as u8
}

/// Vigenère decode step: `source - key`, wrapped into `[0, n)`.
#[inline]
pub fn uncombine(source: u8, key: u8, n: u8) -> u8 {
    debug_assert!(source < n && key < n);
    ((source as u16 + n as u16 - key as u16) % n as u16) as u8
}

/// Expand four sextets into three bytes.
#[inline]
pub fn unpack(a: u8, b: u8, c: u8, d: u8) -> [u8; 3] {
    [
        (a << 2) | (b >> 4),
        ((b & 0x0f) << 4) | (c >> 2),
        ((c & 0x03) << 6) | d,
    ]
}

/// Split three bytes into four sextets.
#[inline]
pub fn pack(bytes: [u8; 3]) -> [u8; 4] {
    [
        bytes[0] >> 2,
        ((bytes[0] & 0x03) << 4) | (bytes[1] >> 4),
        ((bytes[1] & 0x0f) << 2) | (bytes[2] >> 6),
        bytes[2] & 0x3f,
    ]
}
