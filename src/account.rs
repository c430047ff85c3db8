//!
//! mkhomedir account module
//! ------------------------
//! Resolves a username to the identity fields the provisioning stages need:
//! numeric uid, primary gid and the registered home path from the system
//! account database. The lookup goes through `getpwnam_r` so it works against
//! whatever NSS sources the host is configured with (files, LDAP, SSSD, ...).

use crate::error::{ProvisionError, ProvisionResult};
use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::path::PathBuf;

/// Identity of the account being provisioned. Immutable within an invocation.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    /// The home path registered in the account database. Its basename names
    /// the per-user directory under each base; it is not necessarily equal to
    /// the username.
    pub home_path: PathBuf,
}

// getpwnam_r wants a caller-supplied buffer for the string fields; start small
// and grow on ERANGE up to a sane cap.
const INITIAL_BUF: usize = 1024;
const MAX_BUF: usize = 1 << 20;

/// Look up a user in the system account database.
pub fn lookup_user(name: &str) -> ProvisionResult<UserIdentity> {
    let c_name = CString::new(name)
        .map_err(|_| ProvisionError::lookup(name, "username contains an interior NUL"))?;

    let mut buf: Vec<u8> = vec![0; INITIAL_BUF];
    loop {
        let mut pwd = MaybeUninit::<libc::passwd>::uninit();
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe {
            libc::getpwnam_r(
                c_name.as_ptr(),
                pwd.as_mut_ptr(),
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                &mut result,
            )
        };

        if rc == libc::ERANGE {
            if buf.len() >= MAX_BUF {
                return Err(ProvisionError::lookup(
                    name.to_string(),
                    "passwd entry exceeds maximum buffer size".to_string(),
                ));
            }
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return Err(ProvisionError::lookup(
                name.to_string(),
                std::io::Error::from_raw_os_error(rc).to_string(),
            ));
        }
        if result.is_null() {
            return Err(ProvisionError::lookup(name, "no such user"));
        }

        // result points at pwd with string fields inside buf; both are alive here.
        let pwd = unsafe { pwd.assume_init() };
        let home = unsafe { CStr::from_ptr(pwd.pw_dir) }.to_string_lossy().into_owned();
        if home.is_empty() {
            return Err(ProvisionError::lookup(name, "account has no registered home path"));
        }
        return Ok(UserIdentity {
            name: name.to_string(),
            uid: pwd.pw_uid,
            gid: pwd.pw_gid,
            home_path: PathBuf::from(home),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves() {
        let id = lookup_user("root").expect("root must exist");
        assert_eq!(id.uid, 0);
        assert!(!id.home_path.as_os_str().is_empty());
    }

    #[test]
    fn unknown_user_is_a_lookup_error() {
        let err = lookup_user("no-such-user-mkhomedir").unwrap_err();
        assert!(matches!(err, ProvisionError::Lookup { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(lookup_user("ali\0ce").is_err());
    }
}
