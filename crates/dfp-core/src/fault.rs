//! The closed per-command error taxonomy signalled over the wire.

use thiserror::Error;

/// A command-level failure a server reports to the client.
///
/// The `Display` strings are the exact on-wire error messages; existing
/// deployments match on them, so they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("Requested folder does not exists on server")]
    FolderNotFound,

    #[error("Requested folder already exists on server")]
    FolderExists,

    #[error("Requested file does not exists on server")]
    FileNotFound,

    #[error("Invalid Username/Password. Please try again")]
    AuthFailed,
}

impl OpError {
    /// Integer discriminant of this error kind.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::FolderNotFound => 1,
            Self::FolderExists => 2,
            Self::FileNotFound => 3,
            Self::AuthFailed => 4,
        }
    }

    /// Recover the kind from an on-wire message, if it is one of ours.
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        [
            Self::FolderNotFound,
            Self::FolderExists,
            Self::FileNotFound,
            Self::AuthFailed,
        ]
        .into_iter()
        .find(|kind| kind.to_string() == message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_round_trip() {
        for kind in [
            OpError::FolderNotFound,
            OpError::FolderExists,
            OpError::FileNotFound,
            OpError::AuthFailed,
        ] {
            assert_eq!(OpError::from_message(&kind.to_string()), Some(kind));
        }
        assert_eq!(OpError::from_message("no such error"), None);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(OpError::FolderNotFound.code(), 1);
        assert_eq!(OpError::FolderExists.code(), 2);
        assert_eq!(OpError::FileNotFound.code(), 3);
        assert_eq!(OpError::AuthFailed.code(), 4);
    }
}
