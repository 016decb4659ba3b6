//! Module/package driver.
//!
//! [`ModuleManager`] wraps a [`PackageBackend`] and keeps the last known
//! module state in four partitions (enabled, default, disabled, unknown).
//! Every mutating call queues operations, commits them as one transaction and
//! then re-reads the module listing, whether or not the commit succeeded.
//!
//! Module transitions:
//!
//! | call      | already at stream | enabled at other stream   | otherwise       |
//! |-----------|-------------------|---------------------------|-----------------|
//! | `enable`  | no-op             | disable old, then enable  | enable          |
//! | `install` | no-op             | reset old, then install   | install         |
//! | `disable` | disable           | no-op                     | no-op           |

pub mod backend;
pub mod module_list;

pub use backend::{DnfCli, PackageBackend, TransactionOp};
pub use module_list::{ModuleState, ModuleStates, ModuleStream};

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{BootstrapError, Result};

/// A module stream requested by the version catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnfModule {
    pub name: String,
    pub stream: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl DnfModule {
    pub fn new(name: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stream: stream.into(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn spec(&self) -> String {
        module_spec(&self.name, Some(&self.stream), self.profile.as_deref())
    }
}

impl fmt::Display for DnfModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec())
    }
}

/// `name[:stream][/profile]`. Empty parts are left out.
pub fn module_spec(name: &str, stream: Option<&str>, profile: Option<&str>) -> String {
    let mut spec = name.to_string();
    if let Some(stream) = stream.filter(|s| !s.is_empty()) {
        spec.push(':');
        spec.push_str(stream);
    }
    if let Some(profile) = profile.filter(|p| !p.is_empty()) {
        spec.push('/');
        spec.push_str(profile);
    }
    debug!("module string: {}", spec);
    spec
}

/// Failures that mean the engine refused to act for lack of privileges.
fn needs_root(detail: &str) -> bool {
    let detail = detail.to_lowercase();
    ["superuser", "root user", "run as root", "permission denied"]
        .iter()
        .any(|needle| detail.contains(needle))
}

pub struct ModuleManager<B: PackageBackend> {
    backend: B,
    states: ModuleStates,
    pending: Vec<TransactionOp>,
}

impl<B: PackageBackend> ModuleManager<B> {
    /// Wrap `backend` and load the current module state.
    pub fn new(backend: B) -> Result<Self> {
        let mut manager = Self {
            backend,
            states: ModuleStates::default(),
            pending: Vec::new(),
        };
        manager.refresh()?;
        Ok(manager)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn states(&self) -> &ModuleStates {
        &self.states
    }

    fn refresh(&mut self) -> Result<()> {
        let streams = self.backend.module_list()?;
        self.states = ModuleStates::from_streams(streams);
        debug!(
            "modules: {} enabled, {} default, {} disabled, {} unknown",
            self.states.enabled.len(),
            self.states.default.len(),
            self.states.disabled.len(),
            self.states.unknown.len()
        );
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        debug!("committing changes");
        let ops = std::mem::take(&mut self.pending);
        let outcome = self.backend.do_transaction(&ops);
        let refreshed = self.refresh();

        let err = match outcome {
            Ok(()) => return refreshed,
            Err(err) => err,
        };
        if let Err(refresh_err) = &refreshed {
            error!("module state refresh failed: {}", refresh_err);
        }
        match err {
            BootstrapError::PackageManager { detail } if needs_root(&detail) => {
                error!("Runtime error, please run as root");
                Err(BootstrapError::MustRunAsRoot { detail })
            }
            other => Err(other),
        }
    }

    fn enabled_stream(&self, name: &str) -> Option<&str> {
        self.states.enabled.get(name).map(|m| m.stream.as_str())
    }

    pub fn enable(&mut self, name: &str, stream: Option<&str>, profile: Option<&str>) -> Result<()> {
        if let Some(current) = self.enabled_stream(name).map(str::to_string) {
            if stream.is_some_and(|s| s == current) {
                debug!("{}:{} already enabled", name, current);
                return Ok(());
            }
            self.disable(name, Some(&current), None)?;
        }

        debug!("calling enable");
        self.pending
            .push(TransactionOp::ModuleEnable(module_spec(name, stream, profile)));
        self.commit()
    }

    pub fn disable(&mut self, name: &str, stream: Option<&str>, profile: Option<&str>) -> Result<()> {
        let Some(current) = self.states.enabled.get(name) else {
            debug!("{} missing from enabled modules", name);
            return Ok(());
        };

        if let (Some(s), Some(disabled)) = (stream, self.states.disabled.get(name)) {
            if s == disabled.stream {
                debug!("{}:{} already disabled", name, s);
                return Ok(());
            }
        }

        if stream.is_some_and(|s| s != current.stream) {
            debug!("{} stream {:?} is not the enabled one", name, stream);
            return Ok(());
        }

        if profile.is_some_and(|p| !current.profiles.iter().any(|known| known == p)) {
            debug!("{} profile {:?} not in enabled module", name, profile);
            return Ok(());
        }

        debug!("calling disable");
        self.pending
            .push(TransactionOp::ModuleDisable(module_spec(name, stream, profile)));
        self.commit()
    }

    pub fn reset(&mut self, name: &str, stream: Option<&str>, profile: Option<&str>) -> Result<()> {
        debug!("calling reset");
        self.pending
            .push(TransactionOp::ModuleReset(module_spec(name, stream, profile)));
        self.commit()
    }

    pub fn install(&mut self, name: &str, stream: Option<&str>, profile: Option<&str>) -> Result<()> {
        if let Some(current) = self.enabled_stream(name).map(str::to_string) {
            if stream.is_some_and(|s| s == current) {
                debug!("{}:{} already installed", name, current);
                return Ok(());
            }
            self.reset(name, Some(&current), None)?;
        }

        debug!("calling install");
        self.pending
            .push(TransactionOp::ModuleInstall(module_spec(name, stream, profile)));
        self.commit()
    }

    pub fn enable_module(&mut self, module: &DnfModule) -> Result<()> {
        self.enable(&module.name, Some(&module.stream), module.profile.as_deref())
    }

    /// Queue an upgrade. `*` means every installed package.
    ///
    /// An installed package with nothing newer available is
    /// [`BootstrapError::AlreadySatisfied`].
    fn mark_upgrade(&mut self, package: &str) -> Result<()> {
        if package != "*" {
            if !self.backend.is_installed(package)? {
                return Err(BootstrapError::PackageManager {
                    detail: format!("{package} is not installed"),
                });
            }
            if !self.backend.upgrade_available(package)? {
                return Err(BootstrapError::AlreadySatisfied {
                    package: package.to_string(),
                });
            }
        }
        self.pending.push(TransactionOp::Upgrade(package.to_string()));
        Ok(())
    }

    pub fn install_package(&mut self, package: &str) -> Result<()> {
        self.pending.push(TransactionOp::Install(package.to_string()));
        self.commit()
    }

    pub fn update_package(&mut self, package: &str) -> Result<()> {
        if let Err(e) = self.mark_upgrade(package) {
            self.pending.clear();
            return Err(e);
        }
        self.commit()
    }

    /// Make sure `package` is installed at the newest available build.
    pub fn install_update_package(&mut self, package: &str) -> Result<()> {
        let installed = self.backend.is_installed(package)?;
        self.pending.push(TransactionOp::Install(package.to_string()));

        if installed {
            match self.mark_upgrade(package) {
                Ok(()) => info!("{} will be upgraded", package),
                Err(BootstrapError::AlreadySatisfied { .. }) => {
                    debug!("{} is already the newest version", package);
                }
                Err(e) => {
                    self.pending.clear();
                    return Err(e);
                }
            }
        }
        self.commit()
    }

    pub fn remove_package(&mut self, package: &str) -> Result<()> {
        self.pending.push(TransactionOp::Remove(package.to_string()));
        self.commit()
    }
}
