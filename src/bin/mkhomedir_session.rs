//!
//! mkhomedir session hook binary
//! -----------------------------
//! Entry point invoked by the authentication framework on session open, e.g.
//!
//!   session required pam_exec.so /usr/sbin/mkhomedir_session skel=/etc/skel
//!
//! The username is taken from the first positional argument or, failing that,
//! from the PAM_USER environment variable that pam_exec sets. Recognized
//! option tokens: debug, noacl, skel=<path>, conf=<path>; anything else is
//! ignored. Exit status 0 lets the login proceed (provisioned or skipped),
//! 1 rejects it. On scratch success the resulting environment binding is
//! printed on stdout as NAME=value for the caller to inject.

use anyhow::{anyhow, Context, Result};
use mkhomedir::account;
use mkhomedir::acl::SetfaclTool;
use mkhomedir::config::{self, DebugLevel};
use mkhomedir::session::{self, SessionOutcome};
use std::env;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter};

const USAGE: &str = "mkhomedir_session\n\nUSAGE:\n  mkhomedir_session [USER] [debug] [noacl] [skel=PATH] [conf=PATH]\n\n  USER         account to provision (default: $PAM_USER)\n  debug        verbose diagnostics\n  noacl        disable ACL mode (top-level directory is chowned to the user)\n  skel=PATH    skeleton tree to copy into new home directories (empty disables)\n  conf=PATH    config file location (default /etc/security/mkhomedir.conf)\n";

fn is_option_token(t: &str) -> bool {
    t == "debug" || t == "noacl" || t.contains('=')
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    // First non-option token is the username; everything else is module args.
    let mut username: Option<String> = None;
    let mut tokens: Vec<String> = Vec::new();
    for a in args {
        if username.is_none() && !is_option_token(&a) {
            username = Some(a);
        } else {
            tokens.push(a);
        }
    }

    // Logging comes up before config resolution so resolver diagnostics
    // (malformed config file, unknown tokens) are not lost. RUST_LOG wins
    // when set; otherwise the `debug` token picks the provisional level and
    // the filter is reloaded once the file-resolved verbosity is known.
    // Diagnostics go to stderr; stdout carries the env bindings.
    let rust_log_set = env::var_os("RUST_LOG").is_some();
    let provisional = if tokens.iter().any(|t| t == "debug") {
        DebugLevel::Debug
    } else {
        DebugLevel::Info
    };
    let initial = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(provisional.env_filter_directive()));
    let (filter, reload_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config::resolve(&tokens);
    if !rust_log_set {
        let _ = reload_handle.reload(EnvFilter::new(cfg.debug_level.env_filter_directive()));
    }

    let username = username
        .or_else(|| env::var("PAM_USER").ok())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow!("cannot obtain the user name (no argument and PAM_USER unset)"))?;

    let identity = account::lookup_user(&username)
        .with_context(|| format!("resolving account '{}'", username))?;

    match session::open_session(&cfg, &identity, &SetfaclTool) {
        SessionOutcome::Success { env_bindings } => {
            for (name, value) in env_bindings {
                println!("{}={}", name, value);
            }
        }
        SessionOutcome::SkippedLowPrivilege => {
            info!(target: "mkhomedir", "skipped provisioning for '{}'", username);
        }
        SessionOutcome::Rejected(e) => {
            error!(target: "mkhomedir", "session rejected for '{}': {}", username, e);
            std::process::exit(1);
        }
    }
    Ok(())
}
