//! DFP client library: fans one command out to the storage fleet,
//! aggregates the replies, and drives the piece-transfer sub-protocols.
//!
//! The `dfc` binary is a thin REPL over [`ops`]; the operations return
//! structured outcomes so the integration tests can drive a real fleet
//! in-process.

#![forbid(unsafe_code)]

pub mod input;
pub mod ops;
pub mod session;

pub use input::{parse_line, Command, InputError};
pub use ops::{
    ClientError, GetOutcome, GetOutput, ListOutput, ListedFile, MkdirOutput, PutOutput,
};
pub use session::{Fleet, ServerFault, ServerLink, SessionError};
