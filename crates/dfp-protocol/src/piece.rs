//! The piece stream frame used for transferring one piece payload.
//!
//! ```text
//! 1-byte flag (0) ‖ 4-byte piece id ‖ 4-byte length ‖ length bytes
//! ```
//!
//! The 9-byte header travels first, then the payload in a single
//! `read_exact` loop against the declared length; nothing is buffered
//! past it.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{WireError, INT_LEN};

/// Leading flag byte of a piece stream frame.
pub const PIECE_STREAM_FLAG: u8 = 0;

/// Header size: flag + id + length.
pub const PIECE_HEADER_LEN: usize = 1 + 2 * INT_LEN;

/// Receiver bound for one piece payload. The historical 512-byte cap made
/// any file over 2 KiB untransferable and is deliberately lifted.
pub const MAX_PIECE_LEN: usize = 64 * 1024 * 1024;

/// One received piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceFrame {
    pub id: i32,
    pub payload: Vec<u8>,
}

impl PieceFrame {
    /// Send one piece as a stream frame.
    ///
    /// # Errors
    /// Returns `WireError` on socket failure.
    pub async fn send<W: AsyncWrite + Unpin>(
        writer: &mut W,
        id: i32,
        payload: &[u8],
    ) -> Result<(), WireError> {
        let mut header = [0u8; PIECE_HEADER_LEN];
        header[0] = PIECE_STREAM_FLAG;
        header[1..5].copy_from_slice(&id.to_be_bytes());
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        header[5..9].copy_from_slice(&(payload.len() as i32).to_be_bytes());

        writer.write_all(&header).await?;
        writer.write_all(payload).await?;
        Ok(())
    }

    /// Receive one piece stream frame.
    ///
    /// # Errors
    /// Returns `WireError` on an unknown flag byte, a negative or
    /// oversized length, or a short read.
    pub async fn receive<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, WireError> {
        let mut header = [0u8; PIECE_HEADER_LEN];
        reader.read_exact(&mut header).await?;

        if header[0] != PIECE_STREAM_FLAG {
            return Err(WireError::BadStreamFlag(header[0]));
        }
        let id = i32::from_be_bytes([header[1], header[2], header[3], header[4]]);
        let len = i32::from_be_bytes([header[5], header[6], header[7], header[8]]);
        if len < 0 {
            return Err(WireError::NegativeLength(len));
        }
        #[allow(clippy::cast_sign_loss)]
        let len = len as usize;
        if len > MAX_PIECE_LEN {
            return Err(WireError::FrameTooLarge {
                len,
                max: MAX_PIECE_LEN,
            });
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).await?;
        Ok(Self { id, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn header_layout_is_flag_id_length() {
        let (mut client, mut server) = tokio::io::duplex(64);
        PieceFrame::send(&mut client, 3, b"abc").await.unwrap();

        let mut raw = [0u8; PIECE_HEADER_LEN + 3];
        server.read_exact(&mut raw).await.unwrap();
        assert_eq!(raw[0], PIECE_STREAM_FLAG);
        assert_eq!(&raw[1..5], &[0, 0, 0, 3]);
        assert_eq!(&raw[5..9], &[0, 0, 0, 3]);
        assert_eq!(&raw[9..], b"abc");
    }

    #[tokio::test]
    async fn round_trip() {
        let (mut client, mut server) = tokio::io::duplex(8192);
        let payload: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
        PieceFrame::send(&mut client, 4, &payload).await.unwrap();
        let frame = PieceFrame::receive(&mut server).await.unwrap();
        assert_eq!(frame.id, 4);
        assert_eq!(frame.payload, payload);
    }

    #[tokio::test]
    async fn empty_payload_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(64);
        PieceFrame::send(&mut client, 1, &[]).await.unwrap();
        let frame = PieceFrame::receive(&mut server).await.unwrap();
        assert_eq!(frame.id, 1);
        assert!(frame.payload.is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_flag_byte() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[9u8; PIECE_HEADER_LEN]).await.unwrap();
        let err = PieceFrame::receive(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::BadStreamFlag(9)));
    }

    #[tokio::test]
    async fn rejects_negative_length() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut header = [0u8; PIECE_HEADER_LEN];
        header[1..5].copy_from_slice(&1i32.to_be_bytes());
        header[5..9].copy_from_slice(&(-1i32).to_be_bytes());
        client.write_all(&header).await.unwrap();
        let err = PieceFrame::receive(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::NegativeLength(-1)));
    }

    #[tokio::test]
    async fn short_payload_is_a_short_read() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut header = [0u8; PIECE_HEADER_LEN];
        header[1..5].copy_from_slice(&1i32.to_be_bytes());
        header[5..9].copy_from_slice(&10i32.to_be_bytes());
        client.write_all(&header).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);
        let err = PieceFrame::receive(&mut server).await.unwrap_err();
        assert!(matches!(err, WireError::ShortRead));
    }
}
