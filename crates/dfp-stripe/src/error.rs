//! Error types for striping and reconstruction.

use thiserror::Error;

/// Failures while splitting, masking or reassembling pieces.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StripeError {
    #[error("cipher key must not be empty")]
    EmptyKey,

    #[error("piece {id} missing from reconstruction set")]
    MissingPiece { id: u8 },

    #[error("piece {id} appears more than once")]
    DuplicatePiece { id: u8 },

    #[error("piece id {id} outside 1..={max}")]
    PieceIdOutOfRange { id: u8, max: u8 },
}
