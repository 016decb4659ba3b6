//! Host bootstrap for OpenStack installs on Red Hat family systems.
//!
//! Given a target OpenStack release, this crate works out which package
//! repositories and dnf module streams the host needs and puts them in place:
//!
//! - **Version catalog** - per-distro YAML describing supported releases
//! - **Resolver** - normalizes the host identity and expands a release into
//!   repository descriptors and module streams
//! - **Repository descriptors** - `.repo` files, fetched trunk repos, or
//!   entitlement repos enabled through `subscription-manager`
//! - **Module driver** - enables module streams and installs packages
//!
//! # Architecture
//!
//! ```text
//! rhos-bootstrap (binary)
//!     │
//!     ├── distribution::DistributionIdentity  (os-release / CLI overrides)
//!     ├── catalog::CatalogSearchPath          (<distro>.yaml lookup)
//!     │
//!     ├── distribution::Resolver
//!     │       ├── validate      ──> rhsm::Entitlements
//!     │       └── expand_repos  ──> repos::RepoDescriptor
//!     │                                 ├── centos   (file-backed)
//!     │                                 ├── delorean ──> repos::RepoFetcher
//!     │                                 └── entitlement
//!     │
//!     └── dnf::ModuleManager ──> dnf::PackageBackend (dnf shell)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rhos_bootstrap::{BootstrapConfig, CatalogSearchPath, DistributionIdentity, Resolver};
//! use rhos_bootstrap::repos::ReqwestFetcher;
//!
//! let config = BootstrapConfig::load(None)?;
//! let identity = DistributionIdentity::detect(None, None, None)?;
//! let catalog = CatalogSearchPath::system(&config.data_dirs).load(&identity.id)?;
//! let resolver = Resolver::new(identity, catalog, &config);
//! for repo in resolver.expand_repos("wallaby", true, &ReqwestFetcher::new()?)? {
//!     println!("{}", repo.name());
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod distribution;
pub mod dnf;
pub mod error;
pub mod logging;
pub mod process;
pub mod repos;
pub mod rhsm;

pub use catalog::{CatalogSearchPath, VersionCatalog, VersionEntry};
pub use config::BootstrapConfig;
pub use distribution::{DistributionIdentity, Resolver};
pub use dnf::{DnfModule, ModuleManager};
pub use error::{BootstrapError, Result};
pub use repos::RepoDescriptor;
pub use rhsm::{Entitlements, SubscriptionManager};
