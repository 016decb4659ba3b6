//! CentOS base repositories and the storage SIG (Ceph) add-on.
//!
//! Path layout changed with CentOS Stream 9: releases from
//! [`SIG_PATH_CUTOVER_MAJOR`] on live directly under the mirror root and
//! publish SIG content under `SIGs/`, older ones sit under `centos/`.

use crate::config::default_mirror;
use crate::error::{BootstrapError, Result};

use super::YumRepo;

pub const SIG_PATH_CUTOVER_MAJOR: u32 = 9;

/// Normalized distro id to (mirror release path, major version).
const CENTOS_RELEASE_MAP: &[(&str, &str, u32)] = &[
    ("centos8", "8", 8),
    ("centos8-stream", "8-stream", 8),
    ("centos9-stream", "9-stream", 9),
];

/// Catalog repo name to mirror directory name.
const CENTOS_REPO_MAP: &[(&str, &str)] = &[
    ("baseos", "BaseOS"),
    ("appstream", "AppStream"),
    ("highavailability", "HighAvailability"),
    ("nfv", "nfv"),
    ("powertools", "PowerTools"),
    ("crb", "CRB"),
    ("rt", "RT"),
    ("virt", "virt"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CentosRelease {
    path: &'static str,
    major: u32,
}

impl CentosRelease {
    fn lookup(release: &str) -> Result<Self> {
        CENTOS_RELEASE_MAP
            .iter()
            .find(|(key, _, _)| *key == release)
            .map(|&(_, path, major)| Self { path, major })
            .ok_or_else(|| BootstrapError::DistroNotSupported {
                distro: release.to_string(),
            })
    }

    fn uses_sig_layout(&self) -> bool {
        self.major >= SIG_PATH_CUTOVER_MAJOR
    }

    fn default_mirror(&self) -> &'static str {
        if self.uses_sig_layout() {
            default_mirror("centos-stream")
        } else {
            default_mirror("centos")
        }
    }
}

pub fn is_known_release(release: &str) -> bool {
    CENTOS_RELEASE_MAP.iter().any(|(key, _, _)| *key == release)
}

/// Base repository such as `tripleo-centos-highavailability`.
///
/// Both the release and repo name are checked before anything is built.
pub fn base_repo(centos_release: &str, repo: &str, mirror: Option<&str>) -> Result<YumRepo> {
    let repo_dir = CENTOS_REPO_MAP
        .iter()
        .find(|(key, _)| *key == repo)
        .map(|(_, dir)| *dir)
        .ok_or_else(|| BootstrapError::RepositoryNotSupported {
            repo: repo.to_string(),
        })?;
    let release = CentosRelease::lookup(centos_release)?;
    let mirror = mirror.unwrap_or_else(|| release.default_mirror());

    let baseurl = if release.uses_sig_layout() {
        format!("{mirror}/{}/{repo_dir}/$basearch/os/", release.path)
    } else {
        format!("{mirror}/centos/{}/{repo_dir}/$basearch/os/", release.path)
    };

    let name = format!("tripleo-centos-{repo}");
    Ok(YumRepo::new(name.clone(), name, baseurl, true, false))
}

/// Storage SIG repository such as `tripleo-centos-ceph-octopus`.
pub fn ceph_repo(centos_release: &str, ceph_release: &str, mirror: Option<&str>) -> Result<YumRepo> {
    // The storage SIG never published 8-stream builds; use the CentOS 8 ones.
    let centos_release = if centos_release == "centos8-stream" {
        "centos8"
    } else {
        centos_release
    };
    let release = CentosRelease::lookup(centos_release)?;
    let mirror = mirror.unwrap_or_else(|| release.default_mirror());

    let baseurl = if release.uses_sig_layout() {
        format!(
            "{mirror}/SIGs/{}/storage/$basearch/ceph-{ceph_release}/",
            release.path
        )
    } else {
        format!(
            "{mirror}/centos/{}/storage/$basearch/ceph-{ceph_release}/",
            release.path
        )
    };

    let name = format!("tripleo-centos-ceph-{ceph_release}");
    Ok(YumRepo::new(name.clone(), name, baseurl, true, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_repo_centos8_stream() {
        let repo = base_repo("centos8-stream", "highavailability", None).unwrap();
        assert_eq!(repo.name, "tripleo-centos-highavailability");
        assert_eq!(repo.description, "tripleo-centos-highavailability");
        assert_eq!(
            repo.baseurl,
            "http://mirror.centos.org/centos/8-stream/HighAvailability/$basearch/os/"
        );
        assert!(repo.enabled);
        assert!(!repo.gpgcheck);
    }

    #[test]
    fn test_base_repo_stream9_layout() {
        let repo = base_repo("centos9-stream", "crb", None).unwrap();
        assert_eq!(
            repo.baseurl,
            "http://mirror.stream.centos.org/9-stream/CRB/$basearch/os/"
        );
    }

    #[test]
    fn test_base_repo_custom_mirror() {
        let repo = base_repo("centos8", "powertools", Some("http://local")).unwrap();
        assert_eq!(
            repo.baseurl,
            "http://local/centos/8/PowerTools/$basearch/os/"
        );
    }

    #[test]
    fn test_base_repo_unknown_repo() {
        let err = base_repo("centos8-stream", "bogus", None).unwrap_err();
        assert!(matches!(err, BootstrapError::RepositoryNotSupported { ref repo } if repo == "bogus"));
    }

    #[test]
    fn test_base_repo_unknown_release() {
        let err = base_repo("centos7", "baseos", None).unwrap_err();
        assert!(matches!(err, BootstrapError::DistroNotSupported { ref distro } if distro == "centos7"));
    }

    #[test]
    fn test_ceph_repo_pins_stream8_to_centos8() {
        let repo = ceph_repo("centos8-stream", "pacific", None).unwrap();
        assert_eq!(repo.name, "tripleo-centos-ceph-pacific");
        assert_eq!(
            repo.baseurl,
            "http://mirror.centos.org/centos/8/storage/$basearch/ceph-pacific/"
        );
    }

    #[test]
    fn test_ceph_repo_stream9_sig_layout() {
        let repo = ceph_repo("centos9-stream", "quincy", None).unwrap();
        assert_eq!(
            repo.baseurl,
            "http://mirror.stream.centos.org/SIGs/9-stream/storage/$basearch/ceph-quincy/"
        );
    }

    #[test]
    fn test_ceph_repo_unknown_release() {
        assert!(ceph_repo("rhel8.2", "octopus", None).is_err());
    }

    #[test]
    fn test_known_release() {
        assert!(is_known_release("centos8-stream"));
        assert!(!is_known_release("centos8.2"));
    }
}
