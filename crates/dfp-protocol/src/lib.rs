//! Wire framing for the DFP dispersed file store.
//!
//! Everything on the socket is one of a small set of frames, all integers
//! big-endian:
//!
//! ```text
//! int frame        4 bytes, two's complement, network order
//! byte frame       4-byte length ‖ length bytes
//! signal           1 byte: 'Y' proceed, 'N' reset, 'E' end-get
//! envelope         byte frame carrying the ASCII command line
//! piece report     4-byte count ‖ count × 108-byte piece entry
//! piece stream     1-byte flag 0 ‖ 4-byte piece id ‖ 4-byte length ‖ payload
//! error frame      byte frame carrying one of the fixed error messages
//! ```

#![forbid(unsafe_code)]

mod codec;
mod envelope;
mod piece;
mod report;

pub use codec::*;
pub use envelope::*;
pub use piece::*;
pub use report::*;

/// Dispatch status: the command failed; an error frame follows.
pub const STATUS_ERR: i32 = -1;

/// Dispatch status: command accepted (LIST response / PUT upload follows).
pub const STATUS_ACCEPT: i32 = 0;

/// Dispatch status: success (GET / MKDIR dispatch, PUT completion ACK).
pub const STATUS_OK: i32 = 1;
