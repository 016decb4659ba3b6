//! Error kinds raised by the bootstrap library.
//!
//! Every variant carries the offending name, version or path as a field so the
//! binary can report it without re-deriving anything.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Distribution {distro} is not currently supported")]
    DistroNotSupported { distro: String },

    #[error("Version {version} is not currently supported")]
    VersionNotSupported { version: String },

    #[error("Repository {repo} is unknown")]
    RepositoryNotSupported { repo: String },

    #[error("Red Hat Subscription Manager is not currently configured correctly: {detail}")]
    EntitlementConfig { detail: String },

    #[error("Failed running subscription-manager {command}")]
    EntitlementFailure { command: String },

    #[error("{tool} not available in PATH")]
    EntitlementToolMissing { tool: String },

    #[error("{} does not exist", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("{} is not writable", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("failed to fetch {url}: {detail}")]
    Fetch { url: String, detail: String },

    #[error("invalid version catalog '{}': {detail}", path.display())]
    Catalog { path: PathBuf, detail: String },

    #[error("invalid configuration '{}': {detail}", path.display())]
    Config { path: PathBuf, detail: String },

    #[error("unable to determine OS identity: {detail}")]
    OsRelease { detail: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package manager failure: {detail}")]
    PackageManager { detail: String },

    #[error("package manager refused the transaction, please run as root: {detail}")]
    MustRunAsRoot { detail: String },

    #[error("{package} already satisfies the requested constraint")]
    AlreadySatisfied { package: String },
}

impl BootstrapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
