//! The command envelope: the leading ASCII frame of every connection.
//!
//! ```text
//! FLAG <d> USERNAME <s> PASSWORD <s> FOLDER <s> FILENAME <s>\n
//! ```
//!
//! `<d>` is a [`CommandFlag`] discriminant; `<s>` tokens carry no embedded
//! whitespace. Absent folder/filename values travel as the literal token
//! `NULL` and are normalised to empty strings on decode.

use dfp_core::{CommandFlag, User};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::{self, WireError};

/// Upper bound for an envelope frame.
pub const MAX_ENVELOPE_LEN: usize = 512;

/// Literal token for an absent folder or filename.
pub const ABSENT_FIELD: &str = "NULL";

/// A parsed command envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub flag: CommandFlag,
    pub username: String,
    pub password: String,
    /// Folder path; empty means absent (root).
    pub folder: String,
    /// Basename; empty means absent.
    pub filename: String,
}

impl Envelope {
    /// Build an envelope for `user` performing `flag`.
    #[must_use]
    pub fn new(flag: CommandFlag, user: &User, folder: &str, filename: &str) -> Self {
        Self {
            flag,
            username: user.username.clone(),
            password: user.password.clone(),
            folder: folder.to_string(),
            filename: filename.to_string(),
        }
    }

    /// The credentials carried by this envelope.
    #[must_use]
    pub fn user(&self) -> User {
        User::new(self.username.clone(), self.password.clone())
    }

    /// Render the envelope line, substituting `NULL` for absent fields.
    #[must_use]
    pub fn render(&self) -> String {
        let folder = if self.folder.is_empty() {
            ABSENT_FIELD
        } else {
            &self.folder
        };
        let filename = if self.filename.is_empty() {
            ABSENT_FIELD
        } else {
            &self.filename
        };
        format!(
            "FLAG {} USERNAME {} PASSWORD {} FOLDER {} FILENAME {}\n",
            self.flag.to_wire(),
            self.username,
            self.password,
            folder,
            filename,
        )
    }

    /// Parse an envelope line.
    ///
    /// # Errors
    /// Returns `WireError::MalformedEnvelope` when a keyword, value or the
    /// flag discriminant is missing or unknown.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        let mut tokens = text.split_whitespace();
        let mut field = |keyword: &'static str| -> Result<String, WireError> {
            match tokens.next() {
                Some(k) if k == keyword => {}
                _ => {
                    return Err(WireError::MalformedEnvelope {
                        reason: "missing keyword",
                    })
                }
            }
            tokens
                .next()
                .map(str::to_string)
                .ok_or(WireError::MalformedEnvelope {
                    reason: "missing value",
                })
        };

        let flag = field("FLAG")?
            .parse::<i32>()
            .ok()
            .and_then(CommandFlag::from_wire)
            .ok_or(WireError::MalformedEnvelope {
                reason: "unknown command flag",
            })?;
        let username = field("USERNAME")?;
        let password = field("PASSWORD")?;
        let folder = normalise(field("FOLDER")?);
        let filename = normalise(field("FILENAME")?);

        if tokens.next().is_some() {
            return Err(WireError::MalformedEnvelope {
                reason: "trailing tokens",
            });
        }

        Ok(Self {
            flag,
            username,
            password,
            folder,
            filename,
        })
    }

    /// Send the envelope as a length-prefixed frame.
    ///
    /// # Errors
    /// Returns `WireError` on socket failure.
    pub async fn send<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<(), WireError> {
        codec::write_frame(writer, self.render().as_bytes()).await
    }

    /// Receive and parse an envelope frame.
    ///
    /// # Errors
    /// Returns `WireError` on framing failure, invalid UTF-8 or a
    /// malformed line.
    pub async fn receive<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, WireError> {
        let payload = codec::read_frame(reader, MAX_ENVELOPE_LEN).await?;
        let text = std::str::from_utf8(&payload).map_err(|_| WireError::EnvelopeNotUtf8)?;
        Self::parse(text)
    }
}

fn normalise(value: String) -> String {
    if value == ABSENT_FIELD {
        String::new()
    } else {
        value
    }
}
