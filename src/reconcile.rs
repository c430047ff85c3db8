//!
//! mkhomedir reconcile module
//! --------------------------
//! Computes the per-user directory under a base and classifies what currently
//! sits at that path. Purely observational: nothing here mutates the
//! filesystem, so reconciliation can be re-run safely at any time.

use crate::account::UserIdentity;
use crate::error::{ProvisionError, ProvisionResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Classification of the filesystem node at a resolved user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Absent,
    /// Something exists at the path but it is not a directory. Symlinks count
    /// as wrong-typed (lstat semantics) so a stray link is replaced rather
    /// than silently followed.
    WrongType,
    PresentDirectory,
}

/// The per-user directory is named after the basename of the account's
/// registered home path, not the username; sites exist where the two differ.
pub fn resolve_user_dir(base: &Path, identity: &UserIdentity) -> PathBuf {
    let leaf: OsString = identity
        .home_path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from(identity.name.as_str()));
    base.join(leaf)
}

/// Inspect the node at `path` without following a final symlink.
pub fn inspect(path: &Path) -> ProvisionResult<NodeState> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            if meta.is_dir() {
                Ok(NodeState::PresentDirectory)
            } else {
                Ok(NodeState::WrongType)
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(NodeState::Absent),
        Err(e) => Err(ProvisionError::fs("lstat", path, e)),
    }
}

/// Resolve and classify in one step: `(resolved_user_directory, state)`.
pub fn reconcile(base: &Path, identity: &UserIdentity) -> ProvisionResult<(PathBuf, NodeState)> {
    let dir = resolve_user_dir(base, identity);
    let state = inspect(&dir)?;
    Ok((dir, state))
}
