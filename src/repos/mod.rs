//! Repository descriptors.
//!
//! A descriptor is one repository to turn on. Materializing it is the only
//! side effect it has, and how that happens depends on the variant:
//!
//! - [`RepoDescriptor::Entitlement`] - ask the entitlement tool to enable it
//! - [`RepoDescriptor::Yum`] - render a `.repo` file and write it
//! - [`RepoDescriptor::Remote`] - write a `.repo` body fetched at construction
//!
//! File-backed variants land in the repo directory as `<name>.repo`.

pub mod centos;
pub mod delorean;
pub mod fetch;

pub use delorean::RemoteRepo;
pub use fetch::{RepoFetcher, ReqwestFetcher};

use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};
use serde::Serialize;
use tracing::debug;

use crate::error::{BootstrapError, Result};
use crate::rhsm::Entitlements;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoDescriptor {
    Entitlement(EntitlementRepo),
    Yum(YumRepo),
    Remote(RemoteRepo),
}

impl RepoDescriptor {
    pub fn name(&self) -> &str {
        match self {
            RepoDescriptor::Entitlement(repo) => &repo.name,
            RepoDescriptor::Yum(repo) => &repo.name,
            RepoDescriptor::Remote(repo) => repo.name(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RepoDescriptor::Entitlement(_) => "entitlement",
            RepoDescriptor::Yum(_) => "file",
            RepoDescriptor::Remote(_) => "remote",
        }
    }

    /// Turn the descriptor into an active repository.
    ///
    /// `entitlements` is only touched by the entitlement variant; `repo_dir`
    /// only by the file-backed ones.
    pub fn materialize(&self, repo_dir: &Path, entitlements: &dyn Entitlements) -> Result<()> {
        match self {
            RepoDescriptor::Entitlement(repo) => {
                entitlements.repos(&[repo.name.clone()], &[])?;
                Ok(())
            }
            RepoDescriptor::Yum(repo) => repo.save(repo_dir).map(|_| ()),
            RepoDescriptor::Remote(repo) => repo.save(repo_dir).map(|_| ()),
        }
    }
}

/// Planned action for one descriptor, as printed by `--dry-run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoPlanEntry {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RepoDescriptor {
    pub fn plan_entry(&self, repo_dir: &Path) -> RepoPlanEntry {
        let (path, source) = match self {
            RepoDescriptor::Entitlement(_) => (None, None),
            RepoDescriptor::Yum(repo) => (
                Some(repo_file_path(repo_dir, &repo.name)),
                Some(repo.baseurl.clone()),
            ),
            RepoDescriptor::Remote(repo) => (
                Some(repo_file_path(repo_dir, repo.name())),
                Some(repo.uri().to_string()),
            ),
        };
        RepoPlanEntry {
            name: self.name().to_string(),
            kind: self.kind(),
            path,
            source,
        }
    }
}

/// Repository enabled through the entitlement tool by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementRepo {
    pub name: String,
}

impl EntitlementRepo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A yum/dnf repository definition rendered as an INI block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YumRepo {
    pub name: String,
    pub description: String,
    pub baseurl: String,
    pub enabled: bool,
    pub gpgcheck: bool,
    pub mirrorlist: Option<String>,
    pub metalink: Option<String>,
    pub gpgkey: Option<String>,
}

impl YumRepo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        baseurl: impl Into<String>,
        enabled: bool,
        gpgcheck: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            baseurl: baseurl.into(),
            enabled,
            gpgcheck,
            mirrorlist: None,
            metalink: None,
            gpgkey: None,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("[{}]", self.name),
            format!("name={}", self.description),
        ];
        if !self.baseurl.is_empty() {
            lines.push(format!("baseurl={}", self.baseurl));
        }
        if let Some(mirrorlist) = &self.mirrorlist {
            lines.push(format!("mirrorlist={mirrorlist}"));
        }
        if let Some(metalink) = &self.metalink {
            lines.push(format!("metalink={metalink}"));
        }
        lines.push(format!("enabled={}", u8::from(self.enabled)));
        lines.push(format!("gpgcheck={}", u8::from(self.gpgcheck)));
        if let Some(gpgkey) = &self.gpgkey {
            lines.push(format!("gpgkey={gpgkey}"));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    pub fn save(&self, repo_dir: &Path) -> Result<PathBuf> {
        write_repo_file(repo_dir, &self.name, &self.render())
    }
}

pub fn repo_file_path(repo_dir: &Path, name: &str) -> PathBuf {
    repo_dir.join(format!("{name}.repo"))
}

/// Write `content` to `<repo_dir>/<name>.repo`, replacing any existing file.
///
/// Checks run in a fixed order so the error names the precise problem:
/// directory existence, directory writability, then file writability.
pub fn write_repo_file(repo_dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let repo_path = repo_file_path(repo_dir, name);

    if !repo_dir.is_dir() {
        return Err(BootstrapError::DirectoryNotFound {
            path: repo_dir.to_path_buf(),
        });
    }
    if !is_writable(repo_dir) {
        return Err(BootstrapError::PermissionDenied {
            path: repo_dir.to_path_buf(),
        });
    }
    if repo_path.is_file() && !is_writable(&repo_path) {
        return Err(BootstrapError::PermissionDenied { path: repo_path });
    }

    fs::write(&repo_path, content).map_err(|e| BootstrapError::io(&repo_path, e))?;
    debug!("wrote {}", repo_path.display());
    Ok(repo_path)
}

/// `access(2)` with `W_OK`, i.e. what the kernel would allow this process.
fn is_writable(path: &Path) -> bool {
    access(path, AccessFlags::W_OK).is_ok()
}
