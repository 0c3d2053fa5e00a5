//! Command flags carried in the envelope frame.

/// The command a connection performs. The wire discriminant is the `FLAG`
/// field of the command envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFlag {
    /// List files and sub-folders of a remote folder.
    List,
    /// Fetch the pieces of one file.
    Get,
    /// Store two pieces of one file.
    Put,
    /// Create a remote folder.
    Mkdir,
    /// Standalone credential probe.
    Auth,
}

impl CommandFlag {
    /// Wire discriminant for the envelope `FLAG` field.
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::List => 0,
            Self::Get => 1,
            Self::Put => 2,
            Self::Mkdir => 3,
            Self::Auth => 4,
        }
    }

    /// Decode a wire discriminant.
    #[must_use]
    pub const fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::List),
            1 => Some(Self::Get),
            2 => Some(Self::Put),
            3 => Some(Self::Mkdir),
            4 => Some(Self::Auth),
            _ => None,
        }
    }

    /// Command name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Mkdir => "MKDIR",
            Self::Auth => "AUTH",
        }
    }
}
