//! Core domain types for the DFP dispersed file store.
//!
//! Shared between the client, the storage servers and the wire layer:
//! users and credentials, command flags, remote-path splitting, the
//! configuration file grammars and the closed per-command error taxonomy.

#![forbid(unsafe_code)]

mod command;
mod config;
mod fault;
mod path;
mod user;

pub use command::*;
pub use config::*;
pub use fault::*;
pub use path::*;
pub use user::*;

/// Number of pieces a file is striped into.
pub const PIECE_COUNT: usize = 4;

/// Number of storage servers the placement scheme is defined for.
pub const SERVER_COUNT: usize = 4;

/// Pieces each server holds for one file.
pub const PIECES_PER_SERVER: usize = 2;

/// Number of content-hash residues (placement table rows).
pub const MOD_COUNT: usize = 4;
