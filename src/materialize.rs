//!
//! mkhomedir materialize module
//! ----------------------------
//! Creates the per-user directory when reconciliation found it absent or
//! wrong-typed. With a skeleton source the whole template tree is copied,
//! preserving relative structure, mode bits and symlinks (recreated as links,
//! never followed); without one a single empty directory is created.
//! Ownership is deliberately not touched here; that is the ownership pass's
//! job once the tree exists.

use crate::error::{ProvisionError, ProvisionResult};
use crate::reconcile::NodeState;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Materialize a directory at `dir` given its observed state. `skeleton` is
/// the template tree to copy from, or `None` for a flat empty directory.
///
/// A wrong-typed entry is removed first; this is a destructive correction and
/// the original contents are not preserved.
pub fn materialize(dir: &Path, state: NodeState, skeleton: Option<&Path>) -> ProvisionResult<()> {
    debug_assert!(state != NodeState::PresentDirectory);

    if state == NodeState::WrongType {
        info!(target: "mkhomedir::materialize", "removing non-directory entry at '{}'", dir.display());
        fs::remove_file(dir).map_err(|e| ProvisionError::fs("unlink", dir, e))?;
    }

    match skeleton {
        Some(src) => {
            debug!(
                target: "mkhomedir::materialize",
                "copying skeleton '{}' into '{}'", src.display(), dir.display()
            );
            copy_tree(src, dir)
        }
        None => {
            debug!(target: "mkhomedir::materialize", "creating empty directory '{}'", dir.display());
            fs::create_dir_all(dir).map_err(|e| ProvisionError::fs("mkdir", dir, e))
        }
    }
}

/// Recursively copy the contents of `src` into `dst`, creating `dst` first.
/// A failure part-way leaves a partial copy behind; the caller treats that as
/// fatal and rejects the session.
pub fn copy_tree(src: &Path, dst: &Path) -> ProvisionResult<()> {
    fs::create_dir_all(dst).map_err(|e| ProvisionError::fs("mkdir", dst, e))?;

    // Directory modes are applied after the walk: a template subdirectory
    // without owner-write (e.g. r-x) would otherwise block copying its own
    // contents when running unprivileged.
    let mut dir_modes: Vec<(std::path::PathBuf, fs::Permissions)> = Vec::new();

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            ProvisionError::fs("walk", &path, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ProvisionError::fs("walk", entry.path(), std::io::Error::other(e)))?;
        let out = dst.join(rel);
        let ft = entry.file_type();

        if ft.is_dir() {
            fs::create_dir_all(&out).map_err(|e| ProvisionError::fs("mkdir", &out, e))?;
            let mode = entry
                .metadata()
                .map_err(|e| ProvisionError::fs("stat", entry.path(), e.into()))?
                .permissions();
            dir_modes.push((out, mode));
        } else if ft.is_symlink() {
            let link_target =
                fs::read_link(entry.path()).map_err(|e| ProvisionError::fs("readlink", entry.path(), e))?;
            std::os::unix::fs::symlink(&link_target, &out)
                .map_err(|e| ProvisionError::fs("symlink", &out, e))?;
        } else {
            // fs::copy carries the source permission bits over
            fs::copy(entry.path(), &out).map_err(|e| ProvisionError::fs("copy", &out, e))?;
        }
    }

    for (path, mode) in dir_modes {
        fs::set_permissions(&path, mode).map_err(|e| ProvisionError::fs("chmod", &path, e))?;
    }
    Ok(())
}
