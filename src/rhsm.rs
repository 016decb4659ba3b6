//! Entitlement client wrapping `subscription-manager`.
//!
//! Construct one [`SubscriptionManager`] per run and pass it where needed.
//! The executable is looked up in PATH on first use and cached.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BootstrapError, Result};
use crate::process::{Cmd, CmdError, CmdResult};

pub const SUBSCRIPTION_MANAGER: &str = "subscription-manager";

/// Operations the bootstrap needs from the entitlement tool.
pub trait Entitlements {
    /// Overall registration status. Failure means the host is misconfigured.
    fn status(&self) -> Result<CmdResult>;

    /// Release the host is pinned to, e.g. `Release: 8.2`.
    fn release(&self) -> Result<CmdResult>;

    /// Enable and/or disable repositories by id. Globs like `*` are passed
    /// through to the tool.
    fn repos(&self, enable: &[String], disable: &[String]) -> Result<CmdResult>;
}

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    exe: OnceCell<PathBuf>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` instead of searching PATH.
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        let exe = OnceCell::new();
        let _ = exe.set(path.into());
        Self { exe }
    }

    pub fn exe(&self) -> Result<&Path> {
        if let Some(exe) = self.exe.get() {
            return Ok(exe);
        }
        let found = which::which(SUBSCRIPTION_MANAGER).map_err(|_| {
            BootstrapError::EntitlementToolMissing {
                tool: SUBSCRIPTION_MANAGER.to_string(),
            }
        })?;
        debug!("using {}", found.display());
        Ok(self.exe.get_or_init(|| found))
    }

    pub fn run(&self, args: &[String]) -> Result<CmdResult> {
        let cmd = Cmd::new(self.exe()?).args(args);
        let command_line = cmd.command_line();
        cmd.run().map_err(|e| {
            match &e {
                CmdError::Failed { stderr, .. } => debug!("{}", stderr.trim()),
                CmdError::Spawn { .. } | CmdError::Io { .. } => debug!("{}", e),
            }
            BootstrapError::EntitlementFailure {
                command: command_line,
            }
        })
    }
}

/// Command failure on a status query points at host configuration.
fn as_config_error(err: BootstrapError) -> BootstrapError {
    match err {
        BootstrapError::EntitlementFailure { command } => BootstrapError::EntitlementConfig {
            detail: format!("'{command}' failed"),
        },
        other => other,
    }
}

impl Entitlements for SubscriptionManager {
    fn status(&self) -> Result<CmdResult> {
        self.run(&["status".to_string()]).map_err(as_config_error)
    }

    fn release(&self) -> Result<CmdResult> {
        self.run(&["release".to_string()]).map_err(as_config_error)
    }

    fn repos(&self, enable: &[String], disable: &[String]) -> Result<CmdResult> {
        self.run(&repos_args(enable, disable))
    }
}

fn repos_args(enable: &[String], disable: &[String]) -> Vec<String> {
    let mut args = vec!["repos".to_string()];
    if !enable.is_empty() {
        args.push(format!("--enable={}", enable.join(",")));
    }
    if !disable.is_empty() {
        args.push(format!("--disable={}", disable.join(",")));
    }
    args
}
