//! Striping, placement and reconstruction for the DFP dispersed file store.
//!
//! A file is split into four pieces; a content-hash residue selects a row of
//! the placement table, which assigns two pieces to each of four servers so
//! that any three servers can rebuild the file. This crate also carries the
//! client-side collation of server reports and the per-piece obfuscation
//! layer applied before pieces leave the client.

#![forbid(unsafe_code)]

mod cipher;
mod collate;
mod error;
mod hash;
mod placement;
mod split;

pub use cipher::*;
pub use collate::*;
pub use error::*;
pub use hash::*;
pub use placement::*;
pub use split::*;
