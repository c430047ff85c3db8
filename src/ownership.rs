//!
//! mkhomedir ownership module
//! --------------------------
//! Recursive ownership assignment over a freshly materialized tree. Every
//! entry beneath the root gets the target uid/gid; symlinks have their own
//! link metadata chowned (never the target). The root entry itself is left
//! alone here because the ACL stage decides who owns it: the administrative
//! account in ACL mode, the user otherwise.

use crate::error::{ProvisionError, ProvisionResult};
use std::os::unix::fs::lchown;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Assign `uid:gid` to every entry strictly below `root`. Any single failure
/// aborts the pass; a partially chowned tree is an accepted failure mode and
/// the caller rejects the whole provisioning.
pub fn apply_ownership(root: &Path, uid: u32, gid: u32) -> ProvisionResult<()> {
    debug!(
        target: "mkhomedir::ownership",
        "assigning {}:{} beneath '{}'", uid, gid, root.display()
    );
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            ProvisionError::fs("walk", &path, e.into())
        })?;
        lchown(entry.path(), Some(uid), Some(gid))
            .map_err(|e| ProvisionError::fs("lchown", entry.path(), e))?;
    }
    Ok(())
}
