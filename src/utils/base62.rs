//! Base62 codec between numeric link IDs and short codes.
//!
//! The alphabet starts with lowercase letters, so ID `0` encodes as `"a"` and
//! `62` as `"ba"`. Token length grows with the magnitude of the ID; `u64::MAX`
//! needs 11 characters.

use crate::error::AppError;
use serde_json::json;

/// Symbols in digit order.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const BASE: u64 = ALPHABET.len() as u64;

/// Longest token any `u64` encodes to.
const MAX_TOKEN_LEN: usize = 11;

const INVALID: u8 = u8::MAX;

/// Reverse lookup: byte value -> digit, or [`INVALID`].
const DIGITS: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Encodes an ID as a short code.
///
/// # Examples
///
/// ```
/// use nanolink::utils::base62::encode;
///
/// assert_eq!(encode(0), "a");
/// assert_eq!(encode(61), "9");
/// assert_eq!(encode(62), "ba");
/// ```
pub fn encode(mut id: u64) -> String {
    if id == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut buf = Vec::with_capacity(MAX_TOKEN_LEN);
    while id > 0 {
        buf.push(ALPHABET[(id % BASE) as usize]);
        id /= BASE;
    }
    buf.reverse();

    buf.into_iter().map(char::from).collect()
}

/// Decodes a short code back to its ID.
///
/// # Errors
///
/// Returns [`AppError::InvalidToken`] if the token is empty, contains a
/// character outside [`ALPHABET`], or denotes a value larger than `u64::MAX`.
pub fn decode(token: &str) -> Result<u64, AppError> {
    if token.is_empty() {
        return Err(AppError::invalid_token(
            "Short code must not be empty",
            json!({ "token": token }),
        ));
    }

    let mut id: u64 = 0;
    for (position, byte) in token.bytes().enumerate() {
        let digit = DIGITS[byte as usize];
        if digit == INVALID {
            return Err(AppError::invalid_token(
                "Short code contains a character outside the base62 alphabet",
                json!({ "token": token, "position": position }),
            ));
        }

        id = id
            .checked_mul(BASE)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| {
                AppError::invalid_token(
                    "Short code is out of range",
                    json!({ "token": token }),
                )
            })?;
    }

    Ok(id)
}

/// Returns true if every byte of `token` belongs to the alphabet.
pub fn is_valid(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| DIGITS[b as usize] != INVALID)
}
