//! Human-shareable seed strings.
//!
//! A 32-bit seed is rendered as a short lowercase alphabetic word so users
//! can read it out or paste it to reproduce a shuffle order. The encoding is
//! bijective base-26: digit values run 1..=26 (`'a'` = 1, `'z'` = 26), least
//! significant digit first — at most 7 characters, and zero encodes as the
//! empty string.

use crate::error::{Error, Result};

const BASE: u64 = 26;
const MAX_DIGITS: usize = 7;

/// Encode a seed as a lowercase alphabetic string.
#[must_use]
pub fn encode(seed: i32) -> String {
    let mut residue = u64::from(seed as u32);
    let mut out = String::new();

    while residue != 0 {
        let mut digit = residue % BASE;
        residue /= BASE;
        // A zero remainder is written as the highest digit and borrows
        // from the next position, keeping every digit representable.
        if digit == 0 {
            digit = BASE;
            residue -= 1;
        }
        out.push(char::from(b'a' + (digit as u8) - 1));
    }

    out
}

/// Decode a seed string produced by [`encode`].
///
/// Digit values `c - 'a' + 1` are accumulated with positional weights
/// `26^0..26^6`; the result is reduced modulo 2^32 and reinterpreted as
/// signed. The empty string decodes to zero.
///
/// # Errors
///
/// Returns an error on input longer than 7 characters or characters
/// outside `a..=z`.
pub fn decode(text: &str) -> Result<i32> {
    if text.len() > MAX_DIGITS {
        return Err(Error::InvalidSeed(text.to_string()));
    }

    let mut acc: u64 = 0;
    let mut weight: u64 = 1;
    for c in text.chars() {
        if !c.is_ascii_lowercase() {
            return Err(Error::InvalidSeed(text.to_string()));
        }
        let digit = u64::from(c as u8 - b'a') + 1;
        acc += digit * weight;
        weight *= BASE;
    }

    Ok((acc as u32) as i32)
}
