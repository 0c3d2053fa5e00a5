//! On-disk piece store for DFP storage servers.
//!
//! Each server owns one root directory. Under `<root>/<user>/<folder>/` a
//! piece is a hidden regular file `.<basename>.<pieceId>`; sub-folders are
//! ordinary directories. Workers share nothing but this tree: directory
//! creation is idempotent and piece writes are a single create/write.

#![forbid(unsafe_code)]

mod error;
mod piece_store;

pub use error::*;
pub use piece_store::*;
