//! Unified provisioning error model.
//! This module provides the common error enum used across the reconciliation,
//! materialization, ownership and ACL stages, along with the fatality rule that
//! the session orchestrator applies when mapping failures to session outcomes.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The account database has no usable entry for the user. Should not occur
    /// after a successful authentication, but is handled defensively.
    #[error("account lookup failed for '{user}': {reason}")]
    Lookup { user: String, reason: String },

    /// Any failure during path inspection, materialization or ownership
    /// assignment. Always fatal for the whole session.
    #[error("filesystem operation '{op}' failed on '{}': {source}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ACL-grant step failed (missing tool, non-zero exit, unsupported
    /// filesystem). Never fatal: logged and execution continues.
    #[error("acl grant failed on '{}': {reason}", .path.display())]
    AclGrant { path: PathBuf, reason: String },
}

impl ProvisionError {
    pub fn lookup<S: Into<String>>(user: S, reason: S) -> Self {
        ProvisionError::Lookup { user: user.into(), reason: reason.into() }
    }

    pub fn fs(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        ProvisionError::Filesystem { op, path: path.to_path_buf(), source }
    }

    pub fn acl<S: Into<String>>(path: &Path, reason: S) -> Self {
        ProvisionError::AclGrant { path: path.to_path_buf(), reason: reason.into() }
    }

    /// Whether this error must reject the whole session. ACL grant failures are
    /// an enhancement-layer condition and never block login.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProvisionError::AclGrant { .. })
    }
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn fatality_rule() {
        let p = Path::new("/home/alice");
        assert!(ProvisionError::lookup("alice", "no entry").is_fatal());
        assert!(ProvisionError::fs("mkdir", p, std::io::Error::other("boom")).is_fatal());
        assert!(!ProvisionError::acl(p, "setfacl exited with 1").is_fatal());
    }

    #[test]
    fn display_includes_path_and_operation() {
        let p = Path::new("/home/alice");
        let e = ProvisionError::fs("lchown", p, std::io::Error::other("denied"));
        let s = e.to_string();
        assert!(s.contains("lchown"), "{}", s);
        assert!(s.contains("/home/alice"), "{}", s);
    }
}
