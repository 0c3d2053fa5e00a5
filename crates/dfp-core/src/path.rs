//! Remote object locations and path splitting.

use serde::{Deserialize, Serialize};

/// Location of a file object on the fleet: a posix-like folder path ending
/// in `/` (the root being `/`) and a basename with no `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePath {
    /// Folder component; empty means unspecified (treated as root).
    pub folder: String,
    /// Basename component; may be empty for folder-only paths.
    pub name: String,
}

impl RemotePath {
    /// Split a user-supplied path into folder and basename.
    ///
    /// `a/b/c.txt` -> folder `a/b/`, name `c.txt`; a trailing `/` means
    /// the whole input is a folder; an input without `/` is a bare name.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let (folder, name) = split_path(input);
        Self { folder, name }
    }

    /// Folder to place in an envelope: `/` when unspecified.
    #[must_use]
    pub fn folder_or_root(&self) -> &str {
        if self.folder.is_empty() {
            "/"
        } else {
            &self.folder
        }
    }
}

/// Split a path into `(folder, name)` per the rules of [`RemotePath::parse`].
#[must_use]
pub fn split_path(input: &str) -> (String, String) {
    match input.rfind('/') {
        Some(pos) if pos + 1 < input.len() => {
            (input[..=pos].to_string(), input[pos + 1..].to_string())
        }
        Some(_) => (input.to_string(), String::new()),
        None => (String::new(), input.to_string()),
    }
}

/// Normalise a folder argument so it ends with `/`.
#[must_use]
pub fn ensure_trailing_slash(folder: &str) -> String {
    if folder.is_empty() || folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    }
}
