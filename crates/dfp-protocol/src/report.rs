//! Piece reports: the structured record a server sends to describe which
//! pieces it holds.
//!
//! A [`PieceEntry`] is a fixed 108-byte record: a 100-byte NUL-terminated
//! name field followed by two big-endian piece ids. A [`PieceReport`] is a
//! 4-byte entry count followed by that many entries.

use dfp_core::PIECES_PER_SERVER;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::{self, WireError, INT_LEN};

/// Width of the fixed name field.
pub const NAME_FIELD_LEN: usize = 100;

/// Encoded size of one [`PieceEntry`].
pub const PIECE_ENTRY_LEN: usize = NAME_FIELD_LEN + PIECES_PER_SERVER * INT_LEN;

/// Maximum entries a report may carry.
pub const MAX_REPORT_ENTRIES: usize = 100;

/// Receiver bound for an encoded report.
pub const MAX_REPORT_LEN: usize = INT_LEN + MAX_REPORT_ENTRIES * PIECE_ENTRY_LEN;

/// One basename and the two piece ids a server stores for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceEntry {
    pub name: String,
    pub ids: [i32; PIECES_PER_SERVER],
}

impl PieceEntry {
    /// Append the fixed-width encoding of this entry to `buf`.
    ///
    /// # Errors
    /// Returns `WireError` if the name does not fit the field or contains
    /// NUL.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        let name = self.name.as_bytes();
        if name.len() >= NAME_FIELD_LEN {
            return Err(WireError::NameTooLong {
                len: name.len(),
                max: NAME_FIELD_LEN - 1,
            });
        }
        if name.contains(&0) {
            return Err(WireError::NameContainsNul);
        }

        let mut field = [0u8; NAME_FIELD_LEN];
        field[..name.len()].copy_from_slice(name);
        buf.extend_from_slice(&field);
        for id in self.ids {
            buf.extend_from_slice(&id.to_be_bytes());
        }
        Ok(())
    }

    /// Decode one fixed-width entry.
    ///
    /// # Errors
    /// Returns `WireError` on a short slice or a non-UTF-8 name.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < PIECE_ENTRY_LEN {
            return Err(WireError::LengthMismatch {
                claimed: PIECE_ENTRY_LEN,
                computed: bytes.len(),
            });
        }
        let field = &bytes[..NAME_FIELD_LEN];
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        let name = std::str::from_utf8(&field[..end])
            .map_err(|_| WireError::EnvelopeNotUtf8)?
            .to_string();

        let mut ids = [0i32; PIECES_PER_SERVER];
        for (slot, id) in ids.iter_mut().enumerate() {
            let at = NAME_FIELD_LEN + slot * INT_LEN;
            *id = i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        }
        Ok(Self { name, ids })
    }
}

/// A server's answer to "which pieces do you hold here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceReport {
    pub entries: Vec<PieceEntry>,
}

impl PieceReport {
    /// Encode count + entries.
    ///
    /// # Errors
    /// Returns `WireError` when an entry's name cannot be encoded.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::with_capacity(INT_LEN + self.entries.len() * PIECE_ENTRY_LEN);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        buf.extend_from_slice(&(self.entries.len() as i32).to_be_bytes());
        for entry in &self.entries {
            entry.encode_into(&mut buf)?;
        }
        Ok(buf)
    }

    /// Decode an encoded report, validating the count against the payload.
    ///
    /// # Errors
    /// Returns `WireError` on a negative/oversized count or a payload whose
    /// length disagrees with it.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < INT_LEN {
            return Err(WireError::LengthMismatch {
                claimed: INT_LEN,
                computed: bytes.len(),
            });
        }
        let count = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if count < 0 {
            return Err(WireError::NegativeLength(count));
        }
        #[allow(clippy::cast_sign_loss)]
        let count = count as usize;
        if count > MAX_REPORT_ENTRIES {
            return Err(WireError::FrameTooLarge {
                len: count,
                max: MAX_REPORT_ENTRIES,
            });
        }
        let expected = INT_LEN + count * PIECE_ENTRY_LEN;
        if bytes.len() != expected {
            return Err(WireError::LengthMismatch {
                claimed: expected,
                computed: bytes.len(),
            });
        }

        let entries = bytes[INT_LEN..]
            .chunks_exact(PIECE_ENTRY_LEN)
            .map(PieceEntry::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Send the report as a length-prefixed frame (payload size, payload).
    ///
    /// # Errors
    /// Returns `WireError` on encode or socket failure.
    pub async fn send<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), WireError> {
        let payload = self.encode()?;
        codec::write_frame(writer, &payload).await
    }

    /// Receive a length-prefixed report frame.
    ///
    /// # Errors
    /// Returns `WireError` on framing failure or a malformed payload.
    pub async fn receive<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, WireError> {
        let payload = codec::read_frame(reader, MAX_REPORT_LEN).await?;
        Self::decode(&payload)
    }
}
