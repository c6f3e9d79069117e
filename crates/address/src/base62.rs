//! Base62 positional encoding.
//!
//! Digits `0-9`, then `A-Z`, then `a-z`. There is no padding, so the output
//! length depends on the magnitude of the value: `encode(0)` is `"0"` and a
//! 64-bit value never takes more than 11 characters.

use crate::error::{ErrorKind, Result};

/// The 62 symbols, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: u32 = 62;

/// Encode an unsigned integer.
///
/// ```
/// use stash_address::base62;
/// assert_eq!(base62::encode(0), "0");
/// assert_eq!(base62::encode(61), "z");
/// assert_eq!(base62::encode(62), "10");
/// ```
#[must_use]
pub fn encode(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(22);
    while n > 0 {
        out.push(ALPHABET[(n % u128::from(BASE)) as usize]);
        n /= u128::from(BASE);
    }
    out.into_iter().rev().map(char::from).collect()
}

/// Encode a big-endian unsigned integer of any width.
///
/// Used for truncated digests, which may be wider than any native integer.
/// Leading zero bytes do not change the result.
///
/// ```
/// use stash_address::base62;
/// assert_eq!(base62::encode_bytes(&[0x00, 0x00, 0x3E]), "10");
/// assert_eq!(base62::encode_bytes(&[]), "0");
/// ```
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    let mut digits: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if digits.is_empty() {
        return "0".to_string();
    }
    let mut out = Vec::with_capacity(digits.len() * 4 / 3 + 1);
    // Schoolbook long division by 62, one byte at a time. The accumulator
    // never exceeds 61 * 256 + 255, so every quotient digit fits in a byte.
    while !digits.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(digits.len());
        for byte in &digits {
            let acc = (remainder << 8) | u32::from(*byte);
            let q = acc / BASE;
            remainder = acc % BASE;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        out.push(ALPHABET[remainder as usize]);
        digits = quotient;
    }
    out.into_iter().rev().map(char::from).collect()
}

/// Decode a base62 string into an unsigned integer.
///
/// # Errors
/// - [`InvalidCharacter`](ErrorKind::InvalidCharacter) for anything outside
///   the alphabet.
/// - [`Empty`](ErrorKind::Empty) for an empty string.
/// - [`Overflow`](ErrorKind::Overflow) if the value does not fit in a `u128`.
pub fn decode(s: &str) -> Result<u128> {
    if s.is_empty() {
        exn::bail!(ErrorKind::Empty);
    }
    s.chars().try_fold(0u128, |acc, c| {
        let digit = value_of(c)?;
        acc.checked_mul(u128::from(BASE))
            .and_then(|v| v.checked_add(u128::from(digit)))
            .ok_or_else(|| exn::Exn::from(ErrorKind::Overflow))
    })
}

/// Decode a base62 string into minimal big-endian bytes (`[0]` for `"0"`).
///
/// # Errors
/// Same as [`decode`], minus the overflow case.
pub fn decode_bytes(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() {
        exn::bail!(ErrorKind::Empty);
    }
    // Little-endian accumulator; flipped at the end.
    let mut bytes: Vec<u8> = vec![0];
    for c in s.chars() {
        let mut carry = u32::from(value_of(c)?);
        for byte in bytes.iter_mut() {
            let acc = u32::from(*byte) * BASE + carry;
            *byte = (acc & 0xFF) as u8;
            carry = acc >> 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }
    while bytes.len() > 1 && bytes.last() == Some(&0) {
        bytes.pop();
    }
    bytes.reverse();
    Ok(bytes)
}

/// Returns `true` if every character of `s` belongs to the alphabet.
#[must_use]
pub fn is_valid(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn value_of(c: char) -> Result<u8> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'A'..='Z' => Ok(c as u8 - b'A' + 10),
        'a'..='z' => Ok(c as u8 - b'a' + 36),
        _ => exn::bail!(ErrorKind::InvalidCharacter(c)),
    }
}
