//! The per-server piece store rooted at one directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dfp_core::{User, PIECES_PER_SERVER};
use tracing::debug;

use crate::error::StoreError;

/// Pieces found locally for one basename. Only basenames with at least
/// [`PIECES_PER_SERVER`] pieces are reported; ids are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub name: String,
    pub ids: Vec<u8>,
}

impl ScanEntry {
    /// The two ids this server reports for the basename.
    #[must_use]
    pub fn report_pair(&self) -> [u8; PIECES_PER_SERVER] {
        [self.ids[0], self.ids[1]]
    }
}

/// Object store for one server instance.
#[derive(Debug, Clone)]
pub struct PieceStore {
    root: PathBuf,
}

impl PieceStore {
    /// Create a store rooted at `root`. Nothing is touched until the first
    /// operation.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and one directory per configured user.
    ///
    /// # Errors
    /// Returns `StoreError::Io` when a directory cannot be created.
    pub async fn ensure_user_dirs(&self, users: &[User]) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;
        for user in users {
            let dir = self.root.join(&user.username);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Whether the user's folder exists on disk.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` for a folder that escapes the
    /// user directory.
    pub async fn folder_exists(&self, user: &str, folder: &str) -> Result<bool, StoreError> {
        let path = self.resolve_folder(user, folder)?;
        Ok(tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    /// Scan a folder and group hidden piece files by basename.
    ///
    /// With `filter` set, only that basename is considered (the GET case).
    /// A basename is present locally iff at least two piece files exist.
    ///
    /// # Errors
    /// Returns `StoreError` for an invalid path or an unreadable directory.
    pub async fn scan_folder(
        &self,
        user: &str,
        folder: &str,
        filter: Option<&str>,
    ) -> Result<Vec<ScanEntry>, StoreError> {
        let path = self.resolve_folder(user, folder)?;
        let mut found: BTreeMap<String, Vec<u8>> = BTreeMap::new();

        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&path, e))?
        {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some((base, id)) = parse_piece_file_name(file_name) else {
                continue;
            };
            if filter.is_some_and(|want| want != base) {
                continue;
            }
            let ids = found.entry(base.to_string()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut scan = Vec::new();
        for (name, mut ids) in found {
            if ids.len() < PIECES_PER_SERVER {
                continue;
            }
            ids.sort_unstable();
            scan.push(ScanEntry { name, ids });
        }
        debug!(folder = %path.display(), files = scan.len(), "scanned folder");
        Ok(scan)
    }

    /// Names of the sub-folders of a folder, each with a trailing `/`.
    ///
    /// # Errors
    /// Returns `StoreError` for an invalid path or an unreadable directory.
    pub async fn subfolders(&self, user: &str, folder: &str) -> Result<Vec<String>, StoreError> {
        let path = self.resolve_folder(user, folder)?;
        let mut names = Vec::new();

        let mut entries = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&path, e))?
        {
            let kind = entry.file_type().await.map_err(|e| StoreError::io(&path, e))?;
            if !kind.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(format!("{name}/"));
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Read one stored piece payload.
    ///
    /// # Errors
    /// Returns `StoreError::PieceNotFound` when the piece file is absent.
    pub async fn read_piece(
        &self,
        user: &str,
        folder: &str,
        name: &str,
        id: u8,
    ) -> Result<Vec<u8>, StoreError> {
        let path = self.piece_path(user, folder, name, id)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::PieceNotFound {
                    name: name.to_string(),
                    id,
                }
            } else {
                StoreError::io(&path, e)
            }
        })
    }

    /// Store one piece payload, creating directories as needed.
    ///
    /// # Errors
    /// Returns `StoreError` for an invalid path or a failed write.
    pub async fn write_piece(
        &self,
        user: &str,
        folder: &str,
        name: &str,
        id: u8,
        payload: &[u8],
    ) -> Result<(), StoreError> {
        let path = self.piece_path(user, folder, name, id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        tokio::fs::write(&path, payload)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        debug!(piece = %path.display(), bytes = payload.len(), "piece written");
        Ok(())
    }

    /// Create a folder recursively; an existing folder is an error.
    ///
    /// # Errors
    /// Returns `StoreError::FolderExists` when the target already exists.
    pub async fn make_folder(&self, user: &str, folder: &str) -> Result<(), StoreError> {
        let path = self.resolve_folder(user, folder)?;
        if tokio::fs::metadata(&path).await.is_ok() {
            return Err(StoreError::FolderExists { path });
        }
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    fn piece_path(
        &self,
        user: &str,
        folder: &str,
        name: &str,
        id: u8,
    ) -> Result<PathBuf, StoreError> {
        if name.is_empty() || name.contains('/') || name.contains('\0') {
            return Err(StoreError::InvalidPath {
                folder: name.to_string(),
            });
        }
        Ok(self
            .resolve_folder(user, folder)?
            .join(format!(".{name}.{id}")))
    }

    /// Resolve `<root>/<user>/<folder>`, rejecting traversal.
    fn resolve_folder(&self, user: &str, folder: &str) -> Result<PathBuf, StoreError> {
        if user.is_empty() || user.contains('/') || user.contains('\0') {
            return Err(StoreError::InvalidPath {
                folder: user.to_string(),
            });
        }
        let mut path = self.root.join(user);
        for component in folder.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    return Err(StoreError::InvalidPath {
                        folder: folder.to_string(),
                    })
                }
                normal => path.push(normal),
            }
        }
        Ok(path)
    }
}

/// Parse a hidden piece file name `.<basename>.<id>`.
fn parse_piece_file_name(file_name: &str) -> Option<(&str, u8)> {
    let hidden = file_name.strip_prefix('.')?;
    let (base, id) = hidden.rsplit_once('.')?;
    if base.is_empty() {
        return None;
    }
    let id = id.parse::<u8>().ok()?;
    Some((base, id))
}
