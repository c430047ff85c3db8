//!
//! mkhomedir configuration module
//! ------------------------------
//! Resolves the effective settings for one session-hook invocation from three
//! layers: built-in defaults, an optional JSON key/value config file, and the
//! invocation tokens the hosting framework passes to the hook. The result is a
//! single immutable `Config` value that is threaded through every stage; no
//! process-wide mutable flags are kept.
//!
//! Recognized invocation tokens: `debug`, `noacl`, `skel=<path>` (empty value
//! disables skeleton copy for the home directory) and `conf=<path>` (override
//! the config file location). Unknown tokens are ignored.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub const DEFAULT_HOME_BASE: &str = "/home";
pub const DEFAULT_SKEL_DIR: &str = "/etc/skel";
pub const DEFAULT_CONF_PATH: &str = "/etc/security/mkhomedir.conf";
pub const DEFAULT_MINIMUM_UID: u32 = 1000;

/// Reserved uid of the `nobody` account; never provisioned.
pub const NOBODY_UID: u32 = 65534;

/// Diagnostic verbosity for the fixed `mkhomedir` log facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLevel {
    Error,
    Info,
    Debug,
}

impl DebugLevel {
    /// Map a config-file keyword to a level: `error` and `debug` are
    /// recognized, anything else means info.
    pub fn from_keyword(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => DebugLevel::Error,
            "debug" => DebugLevel::Debug,
            _ => DebugLevel::Info,
        }
    }

    /// EnvFilter directive for the crate's log facility at this level.
    pub fn env_filter_directive(&self) -> &'static str {
        match self {
            DebugLevel::Error => "mkhomedir=error",
            DebugLevel::Info => "mkhomedir=info",
            DebugLevel::Debug => "mkhomedir=debug",
        }
    }
}

/// Fully-resolved settings for one invocation. Immutable after `resolve`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for home provisioning; `None` disables the home target.
    pub home_base: Option<PathBuf>,
    /// Base directory for scratch provisioning; `None` disables the target.
    pub scratch_base: Option<PathBuf>,
    /// Skeleton template tree. An empty path disables skeleton copy.
    pub skeleton_source: PathBuf,
    pub acl_enabled: bool,
    /// Accounts below this uid are never provisioned.
    pub minimum_uid: u32,
    pub debug_level: DebugLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            home_base: Some(PathBuf::from(DEFAULT_HOME_BASE)),
            scratch_base: None,
            skeleton_source: PathBuf::from(DEFAULT_SKEL_DIR),
            acl_enabled: true,
            minimum_uid: DEFAULT_MINIMUM_UID,
            debug_level: DebugLevel::Info,
        }
    }
}

impl Config {
    pub fn skeleton_enabled(&self) -> bool {
        !self.skeleton_source.as_os_str().is_empty()
    }
}

/// On-disk JSON shape of the optional config file. All keys optional; a
/// present key is authoritative over the built-in default.
#[derive(Debug, Default, Deserialize)]
struct ConfFile {
    home_dir: Option<String>,
    scratch_dir: Option<String>,
    skel_dir: Option<String>,
    debug_level: Option<String>,
    acl: Option<bool>,
}

fn load_conf_file(path: &Path) -> Option<ConfFile> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return None, // missing or unreadable file falls back to defaults
    };
    match serde_json::from_str::<ConfFile>(&text) {
        Ok(cf) => Some(cf),
        Err(e) => {
            error!(target: "mkhomedir::config", "ignoring malformed config file '{}': {}", path.display(), e);
            None
        }
    }
}

/// Resolve the effective configuration from invocation tokens, reading the
/// config file at its default location unless a `conf=` token overrides it.
pub fn resolve<S: AsRef<str>>(tokens: &[S]) -> Config {
    let conf_path = tokens
        .iter()
        .find_map(|t| t.as_ref().strip_prefix("conf="))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONF_PATH));
    resolve_with_conf(tokens, &conf_path)
}

/// Same as [`resolve`] but with an explicit config file path.
pub fn resolve_with_conf<S: AsRef<str>>(tokens: &[S], conf_path: &Path) -> Config {
    let mut cfg = Config::default();

    if let Some(cf) = load_conf_file(conf_path) {
        if let Some(h) = cf.home_dir {
            cfg.home_base = if h.is_empty() { None } else { Some(PathBuf::from(h)) };
        }
        if let Some(s) = cf.scratch_dir {
            cfg.scratch_base = if s.is_empty() { None } else { Some(PathBuf::from(s)) };
        }
        if let Some(k) = cf.skel_dir {
            cfg.skeleton_source = PathBuf::from(k);
        }
        if let Some(l) = cf.debug_level {
            cfg.debug_level = DebugLevel::from_keyword(&l);
        }
        if let Some(a) = cf.acl {
            cfg.acl_enabled = a;
        }
    }

    // Invocation tokens override the file for the legacy-compatible flags.
    for t in tokens {
        let t = t.as_ref();
        if t == "debug" {
            cfg.debug_level = DebugLevel::Debug;
        } else if t == "noacl" {
            cfg.acl_enabled = false;
        } else if let Some(path) = t.strip_prefix("skel=") {
            cfg.skeleton_source = PathBuf::from(path);
        } else if t.starts_with("conf=") {
            // consumed by the caller when selecting the file
        } else {
            debug!(target: "mkhomedir::config", "ignoring unknown option '{}'", t);
        }
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.home_base.as_deref(), Some(Path::new(DEFAULT_HOME_BASE)));
        assert!(cfg.scratch_base.is_none());
        assert_eq!(cfg.skeleton_source, PathBuf::from(DEFAULT_SKEL_DIR));
        assert!(cfg.acl_enabled);
        assert_eq!(cfg.minimum_uid, DEFAULT_MINIMUM_UID);
        assert!(cfg.skeleton_enabled());
    }

    #[test]
    fn tokens_override_defaults() {
        let cfg = resolve_with_conf(&["debug", "noacl", "skel=/srv/skel"], Path::new("/nonexistent"));
        assert_eq!(cfg.debug_level, DebugLevel::Debug);
        assert!(!cfg.acl_enabled);
        assert_eq!(cfg.skeleton_source, PathBuf::from("/srv/skel"));
    }

    #[test]
    fn empty_skel_token_disables_skeleton() {
        let cfg = resolve_with_conf(&["skel="], Path::new("/nonexistent"));
        assert!(!cfg.skeleton_enabled());
    }

    #[test]
    fn unknown_tokens_are_ignored() {
        let cfg = resolve_with_conf(&["umask=0022", "silent"], Path::new("/nonexistent"));
        assert!(cfg.acl_enabled);
        assert_eq!(cfg.debug_level, DebugLevel::Info);
    }

    #[test]
    fn conf_file_overlays_defaults_and_tokens_win() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{ "home_dir": "/export/home", "scratch_dir": "/scratch", "skel_dir": "/srv/skel", "debug_level": "error", "acl": false }}"#
        )
        .unwrap();
        let cfg = resolve_with_conf::<&str>(&[], f.path());
        assert_eq!(cfg.home_base.as_deref(), Some(Path::new("/export/home")));
        assert_eq!(cfg.scratch_base.as_deref(), Some(Path::new("/scratch")));
        assert_eq!(cfg.skeleton_source, PathBuf::from("/srv/skel"));
        assert_eq!(cfg.debug_level, DebugLevel::Error);
        assert!(!cfg.acl_enabled);

        // legacy flags still override the file
        let cfg = resolve_with_conf(&["debug", "skel=/other"], f.path());
        assert_eq!(cfg.debug_level, DebugLevel::Debug);
        assert_eq!(cfg.skeleton_source, PathBuf::from("/other"));
        assert!(!cfg.acl_enabled, "acl=false from the file is kept");
    }

    #[test]
    fn malformed_conf_file_falls_back_to_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json at all").unwrap();
        let cfg = resolve_with_conf::<&str>(&[], f.path());
        assert_eq!(cfg.home_base.as_deref(), Some(Path::new(DEFAULT_HOME_BASE)));
        assert!(cfg.acl_enabled);
    }

    #[test]
    fn debug_level_keywords() {
        assert_eq!(DebugLevel::from_keyword("error"), DebugLevel::Error);
        assert_eq!(DebugLevel::from_keyword("DEBUG"), DebugLevel::Debug);
        assert_eq!(DebugLevel::from_keyword("verbose"), DebugLevel::Info);
        assert_eq!(DebugLevel::Debug.env_filter_directive(), "mkhomedir=debug");
    }
}
