//! Primitive frame encodings: integers, length-prefixed byte frames,
//! signal bytes and the error frame.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Width of an integer frame in bytes.
pub const INT_LEN: usize = 4;

/// Upper bound for an error-frame message.
pub const MAX_ERROR_LEN: usize = 512;

/// Upper bound for a LIST folder-listing payload.
pub const MAX_FOLDER_LISTING_LEN: usize = 64 * 1024;

/// Wire-level failures. A short read or an out-of-bounds length is fatal
/// for the connection that produced it.
#[derive(Debug, Error)]
pub enum WireError {
    /// The peer closed the connection before a frame was complete.
    #[error("peer closed the connection mid-frame")]
    ShortRead,

    #[error("negative frame length {0}")]
    NegativeLength(i32),

    #[error("frame length {len} exceeds bound {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("frame length mismatch (claimed {claimed}, computed {computed})")]
    LengthMismatch { claimed: usize, computed: usize },

    #[error("unknown signal byte {0:#04x}")]
    BadSignal(u8),

    #[error("bad piece stream flag {0:#04x}")]
    BadStreamFlag(u8),

    #[error("name field too long ({len} bytes, max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("name field contains NUL")]
    NameContainsNul,

    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: &'static str },

    #[error("envelope is not valid UTF-8")]
    EnvelopeNotUtf8,

    #[error("io: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for WireError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::ShortRead
        } else {
            Self::Io(err)
        }
    }
}

/// Inter-phase control token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// 'Y': continue with the piece transfer.
    Proceed,
    /// 'N': reset; in the GET piece loop this requests the next piece.
    Reset,
    /// 'E': terminal; no more pieces wanted from this server.
    EndGet,
}

impl Signal {
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::Proceed => b'Y',
            Self::Reset => b'N',
            Self::EndGet => b'E',
        }
    }

    #[must_use]
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            b'Y' => Some(Self::Proceed),
            b'N' => Some(Self::Reset),
            b'E' => Some(Self::EndGet),
            _ => None,
        }
    }
}

/// Write one big-endian integer frame.
///
/// # Errors
/// Returns `WireError` on socket failure.
pub async fn write_int<W: AsyncWrite + Unpin>(writer: &mut W, value: i32) -> Result<(), WireError> {
    writer.write_all(&value.to_be_bytes()).await?;
    Ok(())
}

/// Read one big-endian integer frame.
///
/// # Errors
/// Returns `WireError::ShortRead` if the peer closes mid-frame.
pub async fn read_int<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, WireError> {
    let mut buf = [0u8; INT_LEN];
    reader.read_exact(&mut buf).await?;
    Ok(i32::from_be_bytes(buf))
}

/// Write a length-prefixed byte frame.
///
/// # Errors
/// Returns `WireError` on socket failure.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), WireError> {
    // Payloads never approach i32::MAX; the receiver bound is far smaller.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    write_int(writer, payload.len() as i32).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Read a length-prefixed byte frame, bounded by `max` for this frame type.
///
/// The whole payload is read with a single `read_exact` loop; there is no
/// sentinel.
///
/// # Errors
/// Returns `WireError` on a negative or oversized length, or a short read.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max: usize,
) -> Result<Vec<u8>, WireError> {
    let len = read_int(reader).await?;
    if len < 0 {
        return Err(WireError::NegativeLength(len));
    }
    #[allow(clippy::cast_sign_loss)]
    let len = len as usize;
    if len > max {
        return Err(WireError::FrameTooLarge { len, max });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Write a signal byte.
///
/// # Errors
/// Returns `WireError` on socket failure.
pub async fn write_signal<W: AsyncWrite + Unpin>(
    writer: &mut W,
    signal: Signal,
) -> Result<(), WireError> {
    writer.write_all(&[signal.to_wire()]).await?;
    Ok(())
}

/// Read a signal byte, rejecting unknown values.
///
/// # Errors
/// Returns `WireError::BadSignal` for a byte outside the signal set.
pub async fn read_signal<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Signal, WireError> {
    let byte = read_signal_byte(reader).await?;
    Signal::from_wire(byte).ok_or(WireError::BadSignal(byte))
}

/// Read one raw signal byte. The LIST post-response wait accepts any value.
///
/// # Errors
/// Returns `WireError::ShortRead` if the peer is already gone.
pub async fn read_signal_byte<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u8, WireError> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).await?;
    Ok(buf[0])
}

/// Write an error frame (length-prefixed ASCII message).
///
/// # Errors
/// Returns `WireError` on socket failure.
pub async fn write_error_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &str,
) -> Result<(), WireError> {
    write_frame(writer, message.as_bytes()).await
}

/// Read an error frame that follows a `-1` status.
///
/// # Errors
/// Returns `WireError` on an oversized frame or a short read.
pub async fn read_error_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, WireError> {
    let payload = read_frame(reader, MAX_ERROR_LEN).await?;
    Ok(String::from_utf8_lossy(&payload).into_owned())
}
