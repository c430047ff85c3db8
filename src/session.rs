//!
//! mkhomedir session module
//! ------------------------
//! Orchestrates one session-open invocation: skip low-privilege accounts,
//! then for each configured base directory (home first, then scratch) run
//! reconcile -> materialize -> ownership -> top-level grant, in that order.
//! Fatal filesystem errors reject the whole session immediately; ACL grant
//! failures are logged and never block login. The three-valued outcome is
//! translated to framework status codes only at the outermost boundary.

use crate::account::UserIdentity;
use crate::acl::{self, AclProvider};
use crate::config::{Config, NOBODY_UID};
use crate::error::{ProvisionError, ProvisionResult};
use crate::materialize;
use crate::ownership;
use crate::reconcile::{self, NodeState};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Well-known environment variable bound to the resolved scratch directory.
pub const SCRATCH_ENV_VAR: &str = "SCRATCHDIR";

/// Which configured base a target came from. The kind, not the path, decides
/// target-specific behavior such as the scratch env binding, so aliased
/// home/scratch bases stay unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Home,
    Scratch,
}

/// One base directory to provision for the current user.
#[derive(Debug, Clone)]
pub struct ProvisioningTarget {
    pub kind: TargetKind,
    pub base_directory: PathBuf,
    pub resolved_user_directory: PathBuf,
    pub use_skeleton: bool,
    pub apply_acl: bool,
}

/// Terminal state of one invocation. Success and SkippedLowPrivilege both let
/// the login proceed; Rejected denies the session and carries the cause.
#[derive(Debug)]
pub enum SessionOutcome {
    Success { env_bindings: Vec<(String, String)> },
    SkippedLowPrivilege,
    Rejected(ProvisionError),
}

fn targets(config: &Config, identity: &UserIdentity) -> Vec<ProvisioningTarget> {
    let mut out = Vec::new();
    if let Some(base) = &config.home_base {
        out.push(ProvisioningTarget {
            kind: TargetKind::Home,
            base_directory: base.clone(),
            resolved_user_directory: reconcile::resolve_user_dir(base, identity),
            use_skeleton: config.skeleton_enabled(),
            apply_acl: config.acl_enabled,
        });
    }
    if let Some(base) = &config.scratch_base {
        out.push(ProvisioningTarget {
            kind: TargetKind::Scratch,
            base_directory: base.clone(),
            resolved_user_directory: reconcile::resolve_user_dir(base, identity),
            // scratch space is always flat; dotfiles belong in the home tree
            use_skeleton: false,
            apply_acl: config.acl_enabled,
        });
    }
    out
}

/// Provision one target. Returns a fatal error for filesystem failures; ACL
/// grant failures are swallowed here after logging.
fn provision_target(
    target: &ProvisioningTarget,
    identity: &UserIdentity,
    config: &Config,
    provider: &dyn AclProvider,
) -> ProvisionResult<()> {
    let dir = &target.resolved_user_directory;
    let state = reconcile::inspect(dir)?;
    debug!(
        target: "mkhomedir::session",
        "target '{}' for '{}': state {:?}", dir.display(), identity.name, state
    );

    if state != NodeState::PresentDirectory {
        let skeleton = if target.use_skeleton { Some(config.skeleton_source.as_path()) } else { None };
        materialize::materialize(dir, state, skeleton)?;
        ownership::apply_ownership(dir, identity.uid, identity.gid)?;
        info!(
            target: "mkhomedir::session",
            "provisioned '{}' for '{}'", dir.display(), identity.name
        );
    }

    // Top-level grant runs on every invocation: it settles root-entry
    // ownership after a fresh materialization and re-asserts the ACL entry on
    // pre-existing directories, since external tooling can drop it.
    if let Err(e) = acl::apply_grant(provider, identity, dir, target.apply_acl) {
        error!(target: "mkhomedir::session", "{}", e);
    }
    Ok(())
}

/// Run the full per-session provisioning sequence.
pub fn open_session(
    config: &Config,
    identity: &UserIdentity,
    provider: &dyn AclProvider,
) -> SessionOutcome {
    if identity.uid < config.minimum_uid || identity.uid == NOBODY_UID {
        debug!(
            target: "mkhomedir::session",
            "uid {} below minimum {} (or reserved); nothing to do", identity.uid, config.minimum_uid
        );
        return SessionOutcome::SkippedLowPrivilege;
    }

    let mut env_bindings: Vec<(String, String)> = Vec::new();
    for target in targets(config, identity) {
        match provision_target(&target, identity, config, provider) {
            Ok(()) => {
                if target.kind == TargetKind::Scratch {
                    env_bindings.push((
                        SCRATCH_ENV_VAR.to_string(),
                        target.resolved_user_directory.display().to_string(),
                    ));
                }
            }
            Err(e) => {
                error!(target: "mkhomedir::session", "rejecting session: {}", e);
                return SessionOutcome::Rejected(e);
            }
        }
    }
    SessionOutcome::Success { env_bindings }
}
