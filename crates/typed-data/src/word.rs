//! 32-byte ABI words for atomic EIP-712 values.
//!
//! Integers and addresses sit at the right end of the word (left padding);
//! fixed-size `bytesN` sit at the left end (right padding).

use alloy_primitives::{Address, U256};

/// One encoded EIP-712 slot.
pub type Word = [u8; 32];

/// Left-pad: 12 zero bytes + 20 address bytes.
pub fn address_word(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Big-endian unsigned integer.
pub fn uint_word(value: &U256) -> Word {
    value.to_be_bytes::<32>()
}

/// Two's-complement signed integer from its magnitude.
///
/// Negative values are sign-extended across the whole word.
pub fn int_word(magnitude: &U256, negative: bool) -> Word {
    if negative {
        U256::ZERO.wrapping_sub(*magnitude).to_be_bytes::<32>()
    } else {
        magnitude.to_be_bytes::<32>()
    }
}

pub fn bool_word(value: bool) -> Word {
    let mut word = [0u8; 32];
    word[31] = value as u8;
    word
}

/// Right-pad: data + trailing zero bytes. Callers guarantee `bytes.len() <= 32`.
pub fn fixed_bytes_word(bytes: &[u8]) -> Word {
    let mut word = [0u8; 32];
    let len = bytes.len().min(32);
    word[..len].copy_from_slice(&bytes[..len]);
    word
}
