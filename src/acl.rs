//!
//! mkhomedir acl module
//! --------------------
//! Top-level grant stage. In ACL mode the directory is locked to the
//! administrative account (root:root, mode rwx------) and the owning user is
//! granted an explicit read/write/execute ACL entry, so plain group or other
//! bits can never leak access. With ACLs disabled the stage falls back to
//! handing the top-level directory to the user, since the recursive ownership
//! pass excludes the root entry.
//!
//! Everything in this stage is non-fatal: an unsupported or misconfigured
//! filesystem must never block login, so failures are logged and the session
//! proceeds.

use crate::account::UserIdentity;
use crate::error::ProvisionError;
use std::fs;
use std::os::unix::fs::{chown, PermissionsExt};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Capability interface for the ACL-grant primitive. One "grant rwx to
/// principal on path" operation; implementations may use a native call or an
/// external tool.
pub trait AclProvider {
    fn grant_rwx(&self, user: &str, path: &Path) -> Result<(), ProvisionError>;
}

/// Production provider: invokes `setfacl -m u:<user>:rwx <path>` and checks
/// the exit status. Re-running the same grant is an idempotent upsert.
pub struct SetfaclTool;

impl AclProvider for SetfaclTool {
    fn grant_rwx(&self, user: &str, path: &Path) -> Result<(), ProvisionError> {
        let status = Command::new("setfacl")
            .arg("-m")
            .arg(format!("u:{}:rwx", user))
            .arg(path)
            .status()
            .map_err(|e| ProvisionError::acl(path, format!("failed to run setfacl: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::acl(path, format!("setfacl exited with {}", status)))
        }
    }
}

/// Apply the top-level grant for one resolved user directory.
///
/// ACL mode: lock the directory to root:root with mode 0700, then grant the
/// user an rwx ACL entry. The grant is re-asserted on every session open even
/// when the directory pre-existed, because external tooling can strip ACL
/// entries. Disabled mode: chown the directory to the user.
pub fn apply_grant(
    provider: &dyn AclProvider,
    identity: &UserIdentity,
    dir: &Path,
    acl_enabled: bool,
) -> Result<(), ProvisionError> {
    if acl_enabled {
        debug!(
            target: "mkhomedir::acl",
            "locking '{}' to root and granting u:{}:rwx", dir.display(), identity.name
        );
        chown(dir, Some(0), Some(0))
            .map_err(|e| ProvisionError::acl(dir, format!("chown to root failed: {}", e)))?;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| ProvisionError::acl(dir, format!("chmod 0700 failed: {}", e)))?;
        provider.grant_rwx(&identity.name, dir)
    } else {
        debug!(
            target: "mkhomedir::acl",
            "acl disabled; assigning '{}' to {}:{}", dir.display(), identity.uid, identity.gid
        );
        chown(dir, Some(identity.uid), Some(identity.gid))
            .map_err(|e| ProvisionError::acl(dir, format!("chown to owner failed: {}", e)))
    }
}
