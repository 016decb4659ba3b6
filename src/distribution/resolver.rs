//! Turns a (distribution, release) pair into the repositories and module
//! streams the host needs.
//!
//! Repo families in the catalog are mapped onto [`RepoFamily`]; each family
//! carries its own construction rule. Entitlement-managed hosts ignore the
//! family entirely and delegate every repo to the entitlement tool.

use tracing::{info, warn};

use crate::catalog::{VersionCatalog, VersionEntry};
use crate::config::{default_mirror, BootstrapConfig};
use crate::dnf::DnfModule;
use crate::error::{BootstrapError, Result};
use crate::repos::{centos, EntitlementRepo, RemoteRepo, RepoDescriptor, RepoFetcher};
use crate::rhsm::Entitlements;

use super::DistributionIdentity;

/// Catalog key of the storage add-on family; repos in it are skipped when the
/// add-on is disabled.
pub const STORAGE_ADDON_FAMILY: &str = "ceph";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoFamily {
    /// Keyed by the distro itself (`centos8-stream`, `rhel8.2`).
    DistroBase,
    Ansible,
    StorageAddon,
    ThirdPartyBuild,
    CorePlatform,
    Virtualization,
    EntitlementVendor,
    SoftwareSwitch,
}

impl RepoFamily {
    /// Map a catalog `repos` key onto a family. Keys starting with the distro
    /// id (`centos8-stream` for a CentOS host) are the distro's own repos.
    pub fn from_key(key: &str, identity: &DistributionIdentity) -> Option<Self> {
        let family = match key {
            "ansible" => Self::Ansible,
            "ceph" => Self::StorageAddon,
            "delorean" => Self::ThirdPartyBuild,
            "openstack" => Self::CorePlatform,
            "virt" => Self::Virtualization,
            "satellite" => Self::EntitlementVendor,
            "openvswitch" => Self::SoftwareSwitch,
            _ if !identity.id.is_empty() && key.starts_with(identity.id.as_str()) => {
                Self::DistroBase
            }
            _ => return None,
        };
        Some(family)
    }
}

/// Resolution context for one host: identity, its catalog and the tool config.
pub struct Resolver<'a> {
    identity: DistributionIdentity,
    catalog: VersionCatalog,
    config: &'a BootstrapConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        identity: DistributionIdentity,
        catalog: VersionCatalog,
        config: &'a BootstrapConfig,
    ) -> Self {
        Self {
            identity,
            catalog,
            config,
        }
    }

    pub fn identity(&self) -> &DistributionIdentity {
        &self.identity
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn normalized_id(&self) -> String {
        self.identity.normalized_id()
    }

    pub fn get_version(&self, version: &str) -> Result<&VersionEntry> {
        self.catalog.version(version).ok_or_else(|| {
            warn!("{} is not available in version list", version);
            BootstrapError::VersionNotSupported {
                version: version.to_string(),
            }
        })
    }

    /// Whether `version` supports this host.
    ///
    /// Unknown releases and unlisted distros answer `false`. On
    /// entitlement-managed hosts the pinned release must also match
    /// `<major>.<minor>`; a mismatch is an [`BootstrapError::EntitlementConfig`]
    /// error because it needs an administrator, not a different request.
    pub fn validate(&self, version: &str, entitlements: &dyn Entitlements) -> Result<bool> {
        let Some(entry) = self.catalog.version(version) else {
            warn!("{} is not available in version list", version);
            return Ok(false);
        };

        let normalized = self.normalized_id();
        if !entry.supports(&normalized) {
            warn!("{} not in {:?}", normalized, entry.distros);
            return Ok(false);
        }

        if self.identity.is_entitlement_managed() {
            self.validate_entitlement_release(entitlements)?;
        }
        Ok(true)
    }

    fn validate_entitlement_release(&self, entitlements: &dyn Entitlements) -> Result<()> {
        entitlements.status()?;
        let release = entitlements.release()?;
        let output = release.stdout.trim();

        let expected = format!(
            "{}.{}",
            self.identity.major_version(),
            self.identity.minor_version()
        );
        let reported = output
            .lines()
            .find_map(|line| line.trim().strip_prefix("Release:"))
            .map(str::trim);

        match reported {
            Some(found) if found == expected => {
                info!("subscription-manager release is {}", found);
                Ok(())
            }
            Some(found) if found.eq_ignore_ascii_case("not set") || found.is_empty() => {
                Err(BootstrapError::EntitlementConfig {
                    detail: format!(
                        "release is not set; run 'subscription-manager release --set={expected}'"
                    ),
                })
            }
            Some(found) => Err(BootstrapError::EntitlementConfig {
                detail: format!("release is set to {found}, expected {expected}"),
            }),
            None if output.contains("not set") => Err(BootstrapError::EntitlementConfig {
                detail: format!(
                    "release is not set; run 'subscription-manager release --set={expected}'"
                ),
            }),
            None => Err(BootstrapError::EntitlementConfig {
                detail: format!("unexpected release output: '{output}'"),
            }),
        }
    }

    /// Build the descriptor for one catalog repo.
    pub fn construct_repo(
        &self,
        repo_family: &str,
        version: &str,
        repo_name: &str,
        fetcher: &dyn RepoFetcher,
    ) -> Result<RepoDescriptor> {
        if self.identity.is_entitlement_managed() {
            return Ok(RepoDescriptor::Entitlement(EntitlementRepo::new(repo_name)));
        }

        let unsupported = || BootstrapError::RepositoryNotSupported {
            repo: repo_family.to_string(),
        };
        let family = RepoFamily::from_key(repo_family, &self.identity).ok_or_else(unsupported)?;
        let release = self.centos_release();

        match family {
            RepoFamily::DistroBase => {
                // A prefix key such as `centos8` names the release directly.
                let release = if centos::is_known_release(repo_family) {
                    repo_family
                } else {
                    release.as_str()
                };
                let mirror = self.file_repo_mirror();
                Ok(RepoDescriptor::Yum(centos::base_repo(
                    release,
                    repo_name,
                    mirror.as_deref(),
                )?))
            }
            RepoFamily::StorageAddon => {
                let mirror = self.file_repo_mirror();
                Ok(RepoDescriptor::Yum(centos::ceph_repo(
                    &release,
                    repo_name,
                    mirror.as_deref(),
                )?))
            }
            RepoFamily::ThirdPartyBuild => {
                let mirror = self
                    .config
                    .mirror("rdo")
                    .unwrap_or_else(|| default_mirror("rdo"));
                Ok(RepoDescriptor::Remote(RemoteRepo::fetch(
                    &self.identity.build_distro(),
                    version,
                    repo_name,
                    mirror,
                    fetcher,
                )?))
            }
            RepoFamily::Ansible
            | RepoFamily::CorePlatform
            | RepoFamily::Virtualization
            | RepoFamily::EntitlementVendor
            | RepoFamily::SoftwareSwitch => Err(unsupported()),
        }
    }

    /// Release key for file-backed repos. A minor release such as
    /// `centos8.2` falls back to its major release when that one is known.
    fn centos_release(&self) -> String {
        let normalized = self.normalized_id();
        if centos::is_known_release(&normalized) {
            return normalized;
        }
        match normalized.split_once('.') {
            Some((major, _)) if centos::is_known_release(major) => major.to_string(),
            _ => normalized,
        }
    }

    /// Catalog and config key naming the mirror for file-backed repos.
    /// Releases past the path cutover are served from the stream mirror.
    fn mirror_key(&self) -> &str {
        let past_cutover = self
            .identity
            .major_number()
            .is_some_and(|major| major >= centos::SIG_PATH_CUTOVER_MAJOR);
        if self.identity.id == "centos" && past_cutover {
            "centos-stream"
        } else {
            self.identity.id.as_str()
        }
    }

    /// Mirror for file-backed repos: explicit config override first, then the
    /// catalog's own `distros.<key>.mirror`, else the built-in default for the
    /// release generation (`None`).
    fn file_repo_mirror(&self) -> Option<String> {
        let key = self.mirror_key();
        if self.config.is_mirror_overridden(key) {
            return self.config.mirror(key).map(str::to_string);
        }
        self.catalog
            .mirror_for(key)
            .map(|m| m.trim_end_matches('/').to_string())
    }

    /// Every descriptor `version` needs, in materialization order: the
    /// distro's own list first, then each configured family in order, each
    /// family's repos in catalog order. With `enable_addon` false, storage
    /// add-on repos are left out.
    pub fn expand_repos(
        &self,
        version: &str,
        enable_addon: bool,
        fetcher: &dyn RepoFetcher,
    ) -> Result<Vec<RepoDescriptor>> {
        let entry = self.get_version(version)?;
        let normalized = self.normalized_id();
        let mut repos = Vec::new();

        match distro_repo_key(entry, &normalized) {
            Some((key, names)) => {
                for name in names {
                    repos.push(self.construct_repo(key, version, name, fetcher)?);
                }
            }
            None => warn!("{} missing from version repos", normalized),
        }

        for family in &self.config.other_repo_families {
            let Some(names) = entry.repo_family(family) else {
                continue;
            };
            for name in names {
                if !enable_addon && is_storage_addon(family, name) {
                    continue;
                }
                repos.push(self.construct_repo(family, version, name, fetcher)?);
            }
        }

        Ok(repos)
    }

    /// Module streams declared for `version`, in catalog order.
    pub fn modules(&self, version: &str) -> Result<Vec<DnfModule>> {
        Ok(self
            .get_version(version)?
            .modules
            .iter()
            .map(|(name, stream)| DnfModule::new(name, stream))
            .collect())
    }
}

/// The distro's own entry in `repos`: keyed by the normalized id, or failing
/// that by a `.`-bounded prefix of it (`centos8` for `centos8.2`).
fn distro_repo_key<'e>(
    entry: &'e VersionEntry,
    normalized: &str,
) -> Option<(&'e str, &'e [String])> {
    let exact = entry.repos.iter().find(|(key, _)| key == normalized);
    let prefixed = || {
        entry.repos.iter().find(|(key, _)| {
            normalized
                .strip_prefix(key.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        })
    };
    exact
        .or_else(prefixed)
        .map(|(key, names)| (key.as_str(), names.as_slice()))
}

fn is_storage_addon(family: &str, repo_name: &str) -> bool {
    family == STORAGE_ADDON_FAMILY || repo_name.contains(STORAGE_ADDON_FAMILY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{centos_catalog, rhel_catalog};
    use crate::repos::delorean::delorean_uri;
    use crate::repos::fetch::tests::FakeFetcher;
    use crate::rhsm::tests::FakeEntitlements;

    const TRUNK: &str = "https://trunk.rdoproject.org";

    fn trunk_fetcher(distro: &str, version: &str) -> FakeFetcher {
        FakeFetcher::default()
            .with_page(
                &delorean_uri(distro, version, "current-tripleo", TRUNK),
                "[current-tripleo]\n",
            )
            .with_page(&delorean_uri(distro, version, "deps", TRUNK), "[deps]\n")
    }

    fn centos_stream<'a>(config: &'a BootstrapConfig) -> Resolver<'a> {
        Resolver::new(
            DistributionIdentity::new("centos", "8", "CentOS Stream"),
            centos_catalog(),
            config,
        )
    }

    fn rhel<'a>(config: &'a BootstrapConfig) -> Resolver<'a> {
        Resolver::new(
            DistributionIdentity::new("rhel", "8.2", "Red Hat"),
            rhel_catalog(),
            config,
        )
    }

    #[test]
    fn test_validate_centos() {
        let config = BootstrapConfig::default();
        let resolver = centos_stream(&config);
        let fake = FakeEntitlements::with_release("");
        assert!(!resolver.validate("doesnotexist", &fake).unwrap());
        assert!(resolver.validate("master", &fake).unwrap());
        assert!(fake.calls().is_empty());

        let other = Resolver::new(
            DistributionIdentity::new("centos", "9", "CentOS Stream"),
            centos_catalog(),
            &config,
        );
        assert!(!other.validate("master", &fake).unwrap());
    }

    #[test]
    fn test_validate_rhel_release_matches() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let fake = FakeEntitlements::with_release("Release: 8.2");
        assert!(!resolver.validate("doesnotexist", &fake).unwrap());
        assert!(resolver.validate("16.1", &fake).unwrap());
        assert_eq!(fake.calls(), vec!["status", "release"]);
    }

    #[test]
    fn test_validate_rhel_release_mismatch() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let fake = FakeEntitlements::with_release("Release: 8.3");
        let err = resolver.validate("16.1", &fake).unwrap_err();
        assert!(matches!(err, BootstrapError::EntitlementConfig { ref detail } if detail.contains("8.3")));
    }

    #[test]
    fn test_validate_rhel_release_not_set() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let fake = FakeEntitlements::with_release("Release not set");
        assert!(matches!(
            resolver.validate("16.1", &fake).unwrap_err(),
            BootstrapError::EntitlementConfig { .. }
        ));

        let fake = FakeEntitlements::with_release("Release: not set");
        let err = resolver.validate("16.1", &fake).unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_validate_rhel_unregistered() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let fake = FakeEntitlements::unregistered();
        assert!(matches!(
            resolver.validate("16.1", &fake).unwrap_err(),
            BootstrapError::EntitlementConfig { .. }
        ));
        assert_eq!(fake.calls(), vec!["status"]);
    }

    #[test]
    fn test_get_version() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        assert!(matches!(
            resolver.get_version("999").unwrap_err(),
            BootstrapError::VersionNotSupported { ref version } if version == "999"
        ));
        assert_eq!(
            resolver.get_version("16.1").unwrap(),
            rhel_catalog().version("16.1").unwrap()
        );
    }

    #[test]
    fn test_construct_repo_rhel_always_entitlement() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let fetcher = FakeFetcher::default();
        for family in ["rhel8.2", "ceph", "nope"] {
            let repo = resolver
                .construct_repo(family, "16.1", "rhel-repo", &fetcher)
                .unwrap();
            assert_eq!(
                repo,
                RepoDescriptor::Entitlement(EntitlementRepo::new("rhel-repo"))
            );
        }
        assert!(fetcher.requested.borrow().is_empty());
    }

    #[test]
    fn test_construct_repo_centos_families() {
        let config = BootstrapConfig::default();
        let resolver = centos_stream(&config);
        let fetcher = trunk_fetcher("centos8", "master");

        let base = resolver
            .construct_repo("centos8-stream", "master", "powertools", &fetcher)
            .unwrap();
        assert_eq!(base.name(), "tripleo-centos-powertools");
        assert_eq!(base.kind(), "file");

        let ceph = resolver
            .construct_repo("ceph", "master", "octopus", &fetcher)
            .unwrap();
        assert_eq!(ceph.name(), "tripleo-centos-ceph-octopus");

        let dlrn = resolver
            .construct_repo("delorean", "master", "current-tripleo", &fetcher)
            .unwrap();
        assert_eq!(dlrn.name(), "tripleo-delorean-current-tripleo");
        assert_eq!(dlrn.kind(), "remote");

        let err = resolver
            .construct_repo("nope", "foo", "bar", &fetcher)
            .unwrap_err();
        assert!(matches!(err, BootstrapError::RepositoryNotSupported { ref repo } if repo == "nope"));

        assert!(matches!(
            resolver.construct_repo("ansible", "master", "x", &fetcher),
            Err(BootstrapError::RepositoryNotSupported { .. })
        ));
    }

    #[test]
    fn test_centos_mirror_from_catalog_and_config() {
        let config = BootstrapConfig::default();
        let resolver = centos_stream(&config);
        let fetcher = FakeFetcher::default();
        let RepoDescriptor::Yum(repo) = resolver
            .construct_repo("centos8-stream", "master", "baseos", &fetcher)
            .unwrap()
        else {
            panic!("expected file repo");
        };
        assert!(repo.baseurl.starts_with("http://mirror.centos.org/centos/8-stream/"));

        let local = BootstrapConfig::from_toml_str(
            "[mirrors]\ncentos = \"http://local\"\n",
            std::path::Path::new("t.toml"),
        )
        .unwrap();
        let resolver = centos_stream(&local);
        let RepoDescriptor::Yum(repo) = resolver
            .construct_repo("centos8-stream", "master", "baseos", &fetcher)
            .unwrap()
        else {
            panic!("expected file repo");
        };
        assert_eq!(repo.baseurl, "http://local/centos/8-stream/BaseOS/$basearch/os/");
    }

    #[test]
    fn test_expand_repos_rhel() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let fetcher = FakeFetcher::default();

        let with_addon = resolver.expand_repos("16.1", true, &fetcher).unwrap();
        assert_eq!(with_addon.len(), 9);
        let names: Vec<&str> = with_addon.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "rhel-8-for-x86_64-baseos-eus-rpms",
                "rhel-8-for-x86_64-appstream-eus-rpms",
                "rhel-8-for-x86_64-highavailability-eus-rpms",
                "ansible-2.9-for-rhel-8-x86_64-rpms",
                "rhceph-4-tools-for-rhel-8-x86_64-rpms",
                "openstack-16.1-for-rhel-8-x86_64-rpms",
                "advanced-virt-for-rhel-8-x86_64-rpms",
                "satellite-tools-6.5-for-rhel-8-x86_64-rpms",
                "fast-datapath-for-rhel-8-x86_64-rpms",
            ]
        );

        let without_addon = resolver.expand_repos("16.1", false, &fetcher).unwrap();
        assert_eq!(without_addon.len(), 8);
        assert!(without_addon.iter().all(|r| !r.name().contains("ceph")));
    }

    #[test]
    fn test_expand_repos_centos_stream_order() {
        let config = BootstrapConfig::default();
        let resolver = centos_stream(&config);
        let fetcher = trunk_fetcher("centos8", "master");

        let repos = resolver.expand_repos("master", true, &fetcher).unwrap();
        let names: Vec<&str> = repos.iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "tripleo-centos-highavailability",
                "tripleo-centos-powertools",
                "tripleo-centos-ceph-octopus",
                "tripleo-delorean-current-tripleo",
                "tripleo-delorean-deps",
            ]
        );

        let without_addon = resolver.expand_repos("master", false, &fetcher).unwrap();
        assert_eq!(without_addon.len(), 4);
    }

    #[test]
    fn test_expand_repos_distro_missing_from_catalog_continues() {
        let config = BootstrapConfig::default();
        let resolver = Resolver::new(
            DistributionIdentity::new("centos", "8.2", "CentOS Linux"),
            centos_catalog(),
            &config,
        );
        let fetcher = trunk_fetcher("centos8", "master");
        let repos = resolver.expand_repos("master", true, &fetcher).unwrap();
        let kinds: Vec<&str> = repos.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec!["file", "remote", "remote"]);
    }

    #[test]
    fn test_expand_repos_follows_configured_family_order() {
        let config = BootstrapConfig::from_toml_str(
            "other_repo_families = [\"delorean\", \"ceph\"]\n",
            std::path::Path::new("t.toml"),
        )
        .unwrap();
        let resolver = centos_stream(&config);
        let fetcher = trunk_fetcher("centos8", "master");
        let repos = resolver.expand_repos("master", true, &fetcher).unwrap();
        let names: Vec<&str> = repos.iter().map(|r| r.name()).collect();
        assert_eq!(
            &names[2..],
            &[
                "tripleo-delorean-current-tripleo",
                "tripleo-delorean-deps",
                "tripleo-centos-ceph-octopus",
            ]
        );
    }

    #[test]
    fn test_expand_repos_fetch_failure_propagates() {
        let config = BootstrapConfig::default();
        let resolver = centos_stream(&config);
        let fetcher = FakeFetcher::default();
        assert!(matches!(
            resolver.expand_repos("master", true, &fetcher),
            Err(BootstrapError::Fetch { .. })
        ));
    }

    #[test]
    fn test_expand_repos_unknown_version() {
        let config = BootstrapConfig::default();
        let resolver = centos_stream(&config);
        assert!(matches!(
            resolver.expand_repos("zed", true, &FakeFetcher::default()),
            Err(BootstrapError::VersionNotSupported { .. })
        ));
    }

    #[test]
    fn test_modules() {
        let config = BootstrapConfig::default();
        let resolver = rhel(&config);
        let modules = resolver.modules("16.1").unwrap();
        assert_eq!(
            modules,
            vec![
                DnfModule::new("container-tools", "2.0"),
                DnfModule::new("virt", "rhel"),
                DnfModule::new("python36", "3.6"),
            ]
        );
    }

    #[test]
    fn test_stream9_uses_stream_mirror() {
        let config = BootstrapConfig::default();
        let catalog = VersionCatalog::from_yaml_str(
            "distros:\n  centos:\n    mirror: [http://mirror.centos.org]\n  centos-stream:\n    mirror: [http://stream.example/]\nversions:\n  zed:\n    distros: [centos9-stream]\n    repos:\n      centos9-stream: [baseos]\n",
            std::path::Path::new("centos.yaml"),
        )
        .unwrap();
        let resolver = Resolver::new(
            DistributionIdentity::new("centos", "9", "CentOS Stream"),
            catalog,
            &config,
        );
        let repos = resolver
            .expand_repos("zed", true, &FakeFetcher::default())
            .unwrap();
        let RepoDescriptor::Yum(repo) = &repos[0] else {
            panic!("expected file repo");
        };
        assert_eq!(repo.baseurl, "http://stream.example/9-stream/BaseOS/$basearch/os/");
    }

    #[test]
    fn test_minor_release_uses_prefix_key() {
        let config = BootstrapConfig::default();
        let catalog = VersionCatalog::from_yaml_str(
            "versions:\n  train:\n    distros: [centos8]\n    repos:\n      centos8: [highavailability]\n",
            std::path::Path::new("centos.yaml"),
        )
        .unwrap();
        let resolver = Resolver::new(
            DistributionIdentity::new("centos", "8.2", "CentOS Linux"),
            catalog,
            &config,
        );
        let fake = FakeEntitlements::with_release("");
        assert!(resolver.validate("train", &fake).unwrap());

        let repos = resolver
            .expand_repos("train", true, &FakeFetcher::default())
            .unwrap();
        let RepoDescriptor::Yum(repo) = &repos[0] else {
            panic!("expected file repo");
        };
        assert_eq!(
            repo.baseurl,
            "http://mirror.centos.org/centos/8/HighAvailability/$basearch/os/"
        );
    }

    #[test]
    fn test_minor_release_with_storage_addon() {
        let config = BootstrapConfig::default();
        let catalog = VersionCatalog::from_yaml_str(
            include_str!("../../data/centos.yaml"),
            std::path::Path::new("centos.yaml"),
        )
        .unwrap();
        let resolver = Resolver::new(
            DistributionIdentity::new("centos", "8.2", "CentOS Linux"),
            catalog,
            &config,
        );
        assert!(resolver
            .validate("train", &FakeEntitlements::with_release(""))
            .unwrap());

        let fetcher = trunk_fetcher("centos8", "train");
        let repos = resolver.expand_repos("train", true, &fetcher).unwrap();
        let ceph = repos
            .iter()
            .find_map(|r| match r {
                RepoDescriptor::Yum(repo) if repo.name.contains("ceph") => Some(repo),
                _ => None,
            })
            .expect("storage repo");
        assert!(ceph.baseurl.starts_with("http://mirror.centos.org/centos/8/storage/"));
    }

    #[test]
    fn test_family_from_key() {
        let identity = DistributionIdentity::new("centos", "8", "CentOS Stream");
        assert_eq!(
            RepoFamily::from_key("centos8-stream", &identity),
            Some(RepoFamily::DistroBase)
        );
        assert_eq!(
            RepoFamily::from_key("ceph", &identity),
            Some(RepoFamily::StorageAddon)
        );
        assert_eq!(
            RepoFamily::from_key("delorean", &identity),
            Some(RepoFamily::ThirdPartyBuild)
        );
        assert_eq!(RepoFamily::from_key("rhel8.2", &identity), None);
    }
}
