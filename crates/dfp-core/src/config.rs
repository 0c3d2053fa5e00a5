//! Client and server configuration files.
//!
//! Both are line-oriented text files read once at startup and immutable
//! thereafter. The client file names the fleet and the user:
//!
//! ```text
//! Server dfs1 127.0.0.1:10001
//! Server dfs2 127.0.0.1:10002
//! Username: alice
//! Password: hunter2
//! ```
//!
//! The server file is one `<username> <password>` pair per line.

use std::path::Path;

use thiserror::Error;

use crate::User;

/// Maximum `Server` lines accepted in a client configuration.
pub const MAX_SERVERS: usize = 10;

/// Maximum user lines accepted in a server configuration.
pub const MAX_USERS: usize = 10;

/// Configuration parse/load failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("no Username line in client config")]
    MissingUsername,

    #[error("no Password line in client config")]
    MissingPassword,

    #[error("no Server lines in client config")]
    NoServers,

    #[error("too many servers ({count}, max {max})")]
    TooManyServers { count: usize, max: usize },

    #[error("too many users ({count}, max {max})")]
    TooManyUsers { count: usize, max: usize },
}

/// One configured storage server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl ServerAddr {
    /// `host:port` string suitable for connecting.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Client-side configuration: the fleet and the acting user.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub servers: Vec<ServerAddr>,
    pub user: User,
}

impl ClientConfig {
    /// Parse the client configuration grammar.
    ///
    /// # Errors
    /// Returns `ConfigError` on malformed lines, a missing user, or an
    /// empty/oversized server list.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut servers = Vec::new();
        let mut username = None;
        let mut password = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("Server ") {
                servers.push(parse_server_line(idx + 1, rest)?);
            } else if let Some(rest) = line.strip_prefix("Username:") {
                username = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("Password:") {
                password = Some(rest.trim().to_string());
            } else {
                return Err(ConfigError::Malformed {
                    line: idx + 1,
                    reason: format!("unrecognised directive {line:?}"),
                });
            }
        }

        if servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        if servers.len() > MAX_SERVERS {
            return Err(ConfigError::TooManyServers {
                count: servers.len(),
                max: MAX_SERVERS,
            });
        }
        let username = username.ok_or(ConfigError::MissingUsername)?;
        let password = password.ok_or(ConfigError::MissingPassword)?;

        Ok(Self {
            servers,
            user: User::new(username, password),
        })
    }

    /// Read and parse a client configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` when the file cannot be read, otherwise
    /// any [`ClientConfig::parse`] error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }
}

fn parse_server_line(line: usize, rest: &str) -> Result<ServerAddr, ConfigError> {
    let malformed = |reason: &str| ConfigError::Malformed {
        line,
        reason: reason.to_string(),
    };

    let mut fields = rest.split_whitespace();
    let name = fields
        .next()
        .ok_or_else(|| malformed("missing server name"))?;
    let endpoint = fields
        .next()
        .ok_or_else(|| malformed("missing server address"))?;
    if fields.next().is_some() {
        return Err(malformed("trailing fields after address"));
    }

    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| malformed("address must be ip:port"))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| malformed("port is not a number"))?;

    Ok(ServerAddr {
        name: name.to_string(),
        host: host.to_string(),
        port,
    })
}

/// Server-side configuration: the accepted users.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub users: Vec<User>,
}

impl ServerConfig {
    /// Parse `<username> <password>` lines.
    ///
    /// # Errors
    /// Returns `ConfigError` on malformed lines or an oversized user list.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut users = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (username, password) =
                line.split_once(' ').ok_or_else(|| ConfigError::Malformed {
                    line: idx + 1,
                    reason: "expected <username> <password>".to_string(),
                })?;
            users.push(User::new(username.trim(), password.trim()));
        }
        if users.len() > MAX_USERS {
            return Err(ConfigError::TooManyUsers {
                count: users.len(),
                max: MAX_USERS,
            });
        }
        Ok(Self { users })
    }

    /// Read and parse a server configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` when the file cannot be read, otherwise
    /// any [`ServerConfig::parse`] error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Exact-match credential check.
    #[must_use]
    pub fn authenticate(&self, user: &User) -> bool {
        self.users.iter().any(|known| known == user)
    }
}
