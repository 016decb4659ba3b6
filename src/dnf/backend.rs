//! Package-manager transaction engine.
//!
//! [`PackageBackend`] is what the module driver needs from the engine: a
//! module listing, two package queries and an all-or-nothing transaction.
//! [`DnfCli`] implements it on top of the `dnf` command line. A transaction is
//! a `dnf shell` script so every queued operation resolves and commits
//! together; signature checking and key import follow the repo's `gpgcheck`
//! and `gpgkey` settings inside dnf itself.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BootstrapError, Result};
use crate::process::{Cmd, CmdError};

use super::module_list::{parse_module_list, ModuleStream};

pub const DNF: &str = "dnf";

/// Exit status of `dnf check-update` when updates are available.
const CHECK_UPDATE_AVAILABLE: i32 = 100;

/// One queued operation. Module variants carry a `name[:stream][/profile]` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOp {
    ModuleEnable(String),
    ModuleDisable(String),
    ModuleReset(String),
    ModuleInstall(String),
    Install(String),
    Upgrade(String),
    Remove(String),
}

impl fmt::Display for TransactionOp {
    /// Rendered as a `dnf shell` command.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleEnable(spec) => write!(f, "module enable {spec}"),
            Self::ModuleDisable(spec) => write!(f, "module disable {spec}"),
            Self::ModuleReset(spec) => write!(f, "module reset {spec}"),
            Self::ModuleInstall(spec) => write!(f, "module install {spec}"),
            Self::Install(pkg) => write!(f, "install {pkg}"),
            Self::Upgrade(pkg) if pkg == "*" => f.write_str("upgrade"),
            Self::Upgrade(pkg) => write!(f, "upgrade {pkg}"),
            Self::Remove(pkg) => write!(f, "remove {pkg}"),
        }
    }
}

pub trait PackageBackend {
    /// Current module streams as the engine sees them.
    fn module_list(&self) -> Result<Vec<ModuleStream>>;

    fn is_installed(&self, package: &str) -> Result<bool>;

    /// Whether a newer build of an installed package is available.
    fn upgrade_available(&self, package: &str) -> Result<bool>;

    /// Resolve and commit `ops` as one transaction.
    fn do_transaction(&mut self, ops: &[TransactionOp]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DnfCli {
    exe: PathBuf,
}

impl DnfCli {
    /// Locate `dnf` in PATH.
    pub fn new() -> Result<Self> {
        let exe = which::which(DNF).map_err(|_| BootstrapError::PackageManager {
            detail: format!("{DNF} not available in PATH"),
        })?;
        debug!("using {}", exe.display());
        Ok(Self { exe })
    }

    pub fn with_executable(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    fn cmd(&self) -> Cmd {
        Cmd::new(&self.exe)
    }
}

/// Render `ops` as a `dnf shell` script ending in `run`.
pub fn shell_script(ops: &[TransactionOp]) -> String {
    let mut script = String::new();
    for op in ops {
        script.push_str(&op.to_string());
        script.push('\n');
    }
    script.push_str("run\n");
    script
}

fn engine_error(err: CmdError) -> BootstrapError {
    let detail = match err {
        CmdError::Failed {
            stderr, message, ..
        } => {
            let stderr = stderr.trim();
            if stderr.is_empty() {
                message
            } else {
                stderr.to_string()
            }
        }
        other @ (CmdError::Spawn { .. } | CmdError::Io { .. }) => other.to_string(),
    };
    BootstrapError::PackageManager { detail }
}

impl PackageBackend for DnfCli {
    fn module_list(&self) -> Result<Vec<ModuleStream>> {
        let out = self
            .cmd()
            .args(["-q", "module", "list"])
            .run()
            .map_err(engine_error)?;
        Ok(parse_module_list(&out.stdout))
    }

    fn is_installed(&self, package: &str) -> Result<bool> {
        let out = self
            .cmd()
            .args(["-q", "list", "--installed", package])
            .allow_fail()
            .run()
            .map_err(engine_error)?;
        Ok(out.success())
    }

    fn upgrade_available(&self, package: &str) -> Result<bool> {
        let out = self
            .cmd()
            .args(["-q", "check-update", package])
            .allow_fail()
            .run()
            .map_err(engine_error)?;
        match out.code {
            Some(0) => Ok(false),
            Some(CHECK_UPDATE_AVAILABLE) => Ok(true),
            code => Err(BootstrapError::PackageManager {
                detail: format!(
                    "check-update {package} exited with {code:?}: {}",
                    out.stderr.trim()
                ),
            }),
        }
    }

    fn do_transaction(&mut self, ops: &[TransactionOp]) -> Result<()> {
        if ops.is_empty() {
            debug!("nothing to commit");
            return Ok(());
        }
        let script = shell_script(ops);
        debug!("dnf shell script:\n{}", script);
        self.cmd()
            .args(["-y", "shell"])
            .stdin(script)
            .error_msg("dnf transaction failed")
            .run()
            .map_err(engine_error)?;
        Ok(())
    }
}
