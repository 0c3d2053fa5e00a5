//! User identity: a (username, password) pair.

use std::fmt;

/// A store user. Both fields are short printable strings with no internal
/// whitespace; the pair must match a configured entry exactly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    /// Create a user from owned or borrowed strings.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// The password never reaches log output.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_requires_both_fields() {
        let a = User::new("alice", "hunter2");
        assert_eq!(a, User::new("alice", "hunter2"));
        assert_ne!(a, User::new("alice", "other"));
        assert_ne!(a, User::new("bob", "hunter2"));
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", User::new("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
