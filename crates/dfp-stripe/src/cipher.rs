//! Per-piece obfuscation: repeating-key XOR keyed by the user's password.
//!
//! The transform is its own inverse; the client applies it before upload
//! and again after download. This is obfuscation, not confidentiality:
//! a known-plaintext prefix recovers the keystream trivially.

use crate::{error::StripeError, split::Piece};

/// XOR `data` in place with the repeating `key`.
///
/// # Errors
/// Returns `StripeError::EmptyKey` for an empty key.
pub fn keystream_xor(data: &mut [u8], key: &[u8]) -> Result<(), StripeError> {
    if key.is_empty() {
        return Err(StripeError::EmptyKey);
    }
    for (offset, byte) in data.iter_mut().enumerate() {
        *byte ^= key[offset % key.len()];
    }
    Ok(())
}

/// Mask (or unmask) every piece payload with the repeating `key`.
///
/// # Errors
/// Returns `StripeError::EmptyKey` for an empty key.
pub fn mask_pieces(pieces: &mut [Piece], key: &[u8]) -> Result<(), StripeError> {
    for piece in pieces {
        keystream_xor(&mut piece.data, key)?;
    }
    Ok(())
}
