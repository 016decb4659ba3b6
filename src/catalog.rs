//! Version catalog: the per-distribution YAML describing which releases are
//! supported, and which repositories and module streams each release needs.
//!
//! ```yaml
//! distros:
//!   centos:
//!     mirror:
//!       - http://mirror.centos.org
//!     versions:
//!       - 8-stream
//! versions:
//!   wallaby:
//!     distros:
//!       - centos8-stream
//!     repos:
//!       centos8-stream:
//!         - highavailability
//!       delorean:
//!         - current-tripleo
//!     modules:
//!       python36: 3.6
//! ```
//!
//! Catalog files are named `<distro_id>.yaml` and located by walking
//! [`CatalogSearchPath`]; the first directory holding the file wins.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{BootstrapError, Result};

pub const DATA_DIR_ENV: &str = "RHOS_BOOTSTRAP_DATA_DIR";
const SHARE_SUBDIR: &str = "share/rhos-bootstrap";
const SYSTEM_DATA_DIRS: &[&str] = &["/usr/local/share/rhos-bootstrap", "/usr/share/rhos-bootstrap"];

/// A YAML scalar coerced to its string form at parse time.
///
/// Unquoted numbers such as `3.6`, `2.0` or `16.1` arrive as floats and are
/// rendered back from the parsed value with at least one decimal. Trailing
/// zeros past the first decimal are lost (`3.10` becomes `"3.1"`), so such
/// values must be quoted in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
                Ok(Scalar(float_to_string(v)))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// `2.0` must stay `"2.0"`, not `"2"`.
fn float_to_string(v: f64) -> String {
    let s = v.to_string();
    if v.is_finite() && !s.contains('.') && !s.contains('e') {
        format!("{s}.0")
    } else {
        s
    }
}

/// Mapping that keeps declaration order.
#[derive(Debug, Clone, PartialEq)]
struct Ordered<V>(Vec<(String, V)>);

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Ordered<V>, E> {
                Ok(Ordered::default())
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Ordered<V>, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<Scalar, V>()? {
                    entries.push((key.0, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_any(OrderedVisitor(PhantomData))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogYaml {
    #[serde(default)]
    distros: Ordered<DistroSourceYaml>,
    #[serde(default)]
    versions: Ordered<VersionYaml>,
}

#[derive(Debug, Default, Deserialize)]
struct DistroSourceYaml {
    #[serde(default)]
    mirror: Vec<String>,
    #[serde(default)]
    versions: Vec<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
struct VersionYaml {
    #[serde(default)]
    distros: Option<Vec<Scalar>>,
    #[serde(default)]
    repos: Option<Ordered<Option<Vec<Scalar>>>>,
    #[serde(default)]
    modules: Option<Ordered<Option<Scalar>>>,
}

/// Mirror and release hints from the catalog's top-level `distros` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistroSource {
    pub mirrors: Vec<String>,
    pub versions: Vec<String>,
}

/// One `versions.<name>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionEntry {
    /// Normalized distro ids (or `.`-bounded prefixes) this release supports.
    pub distros: Vec<String>,
    /// Repo family name to repo names, in declaration order.
    pub repos: Vec<(String, Vec<String>)>,
    /// Module name to stream, in declaration order.
    pub modules: Vec<(String, String)>,
}

impl VersionEntry {
    pub fn repo_family(&self, family: &str) -> Option<&[String]> {
        self.repos
            .iter()
            .find(|(name, _)| name == family)
            .map(|(_, repos)| repos.as_slice())
    }

    /// Whether `normalized_id` is listed, either exactly or under a prefix
    /// such as `rhel8` covering `rhel8.2`.
    pub fn supports(&self, normalized_id: &str) -> bool {
        self.distros.iter().any(|entry| {
            normalized_id == entry
                || normalized_id
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCatalog {
    pub distros: BTreeMap<String, DistroSource>,
    pub versions: BTreeMap<String, VersionEntry>,
}

impl VersionCatalog {
    pub fn from_yaml_str(raw: &str, source: &Path) -> Result<Self> {
        let parsed: CatalogYaml =
            serde_yaml_ng::from_str(raw).map_err(|e| BootstrapError::Catalog {
                path: source.to_path_buf(),
                detail: e.to_string(),
            })?;

        let distros = parsed
            .distros
            .0
            .into_iter()
            .map(|(name, src)| {
                (
                    name,
                    DistroSource {
                        mirrors: src.mirror,
                        versions: src.versions.into_iter().map(|s| s.0).collect(),
                    },
                )
            })
            .collect();

        let versions = parsed
            .versions
            .0
            .into_iter()
            .map(|(name, v)| {
                let entry = VersionEntry {
                    distros: v
                        .distros
                        .unwrap_or_default()
                        .into_iter()
                        .map(|s| s.0)
                        .collect(),
                    repos: v
                        .repos
                        .unwrap_or_default()
                        .0
                        .into_iter()
                        .map(|(family, names)| {
                            (
                                family,
                                names.unwrap_or_default().into_iter().map(|s| s.0).collect(),
                            )
                        })
                        .collect(),
                    modules: v
                        .modules
                        .unwrap_or_default()
                        .0
                        .into_iter()
                        .filter_map(|(module, stream)| stream.map(|s| (module, s.0)))
                        .collect(),
                };
                (name, entry)
            })
            .collect();

        Ok(Self { distros, versions })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| BootstrapError::io(path, e))?;
        Self::from_yaml_str(&raw, path)
    }

    pub fn version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.get(version)
    }

    /// First mirror declared for `distro` in the top-level table.
    pub fn mirror_for(&self, distro: &str) -> Option<&str> {
        self.distros
            .get(distro)
            .and_then(|d| d.mirrors.first())
            .map(String::as_str)
    }
}

/// Ordered list of directories searched for `<distro_id>.yaml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSearchPath {
    dirs: Vec<PathBuf>,
}

impl CatalogSearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Resolution order:
    /// 1. `RHOS_BOOTSTRAP_DATA_DIR` env var
    /// 2. `extra` (configured `data_dirs`)
    /// 3. `<prefix>/share/rhos-bootstrap` when the binary lives outside `/usr`
    /// 4. `/usr/local/share/rhos-bootstrap`
    /// 5. `/usr/share/rhos-bootstrap`
    pub fn system(extra: &[PathBuf]) -> Self {
        let mut dirs = Vec::new();
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            dirs.push(PathBuf::from(dir));
        }
        dirs.extend(extra.iter().cloned());
        if let Some(prefix) = install_prefix() {
            if prefix != Path::new("/usr") {
                dirs.push(prefix.join(SHARE_SUBDIR));
            }
        }
        dirs.extend(SYSTEM_DATA_DIRS.iter().map(PathBuf::from));
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn locate(&self, distro_id: &str) -> Result<PathBuf> {
        let filename = format!("{distro_id}.yaml");
        for dir in &self.dirs {
            let candidate = dir.join(&filename);
            if candidate.is_file() {
                debug!("using version catalog {}", candidate.display());
                return Ok(candidate);
            }
        }
        error!(
            "{} not found in any of: {}",
            filename,
            self.dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Err(BootstrapError::DistroNotSupported {
            distro: distro_id.to_string(),
        })
    }

    pub fn load(&self, distro_id: &str) -> Result<VersionCatalog> {
        VersionCatalog::load(&self.locate(distro_id)?)
    }
}

/// `<prefix>` for a binary installed as `<prefix>/bin/rhos-bootstrap`.
fn install_prefix() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.parent()?.to_path_buf())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const CENTOS_DATA: &str = r#"
---
distros:
  centos:
    mirror:
      - http://mirror.centos.org
    versions:
      - 8-stream

versions:
  master: &master_branch
    distros: &distros_centos8
      - centos8-stream
    repos:
      centos8-stream:
        - highavailability
        - powertools
      ceph:
        - octopus
      delorean:
        - current-tripleo
        - deps
    modules:
      container-tools: rhel8
      virt: rhel
      python36: 3.6
  wallaby: *master_branch
"#;

    pub(crate) const RHEL_DATA: &str = r#"
---
distros:
  redhat:
    versions:
      - 8.2

versions:
  "16.1":
    distros:
      - rhel8.2
    repos:
      rhel8.2:
        - rhel-8-for-x86_64-baseos-eus-rpms
        - rhel-8-for-x86_64-appstream-eus-rpms
        - rhel-8-for-x86_64-highavailability-eus-rpms
      ansible:
        - ansible-2.9-for-rhel-8-x86_64-rpms
      virt:
        - advanced-virt-for-rhel-8-x86_64-rpms
      ceph:
        - rhceph-4-tools-for-rhel-8-x86_64-rpms
      openstack:
        - openstack-16.1-for-rhel-8-x86_64-rpms
      satellite:
        - satellite-tools-6.5-for-rhel-8-x86_64-rpms
      openvswitch:
        - fast-datapath-for-rhel-8-x86_64-rpms
    modules:
      container-tools: 2.0
      virt: rhel
      python36: 3.6
"#;

    pub(crate) fn centos_catalog() -> VersionCatalog {
        VersionCatalog::from_yaml_str(CENTOS_DATA, Path::new("centos.yaml")).unwrap()
    }

    pub(crate) fn rhel_catalog() -> VersionCatalog {
        VersionCatalog::from_yaml_str(RHEL_DATA, Path::new("rhel.yaml")).unwrap()
    }

    #[test]
    fn test_unquoted_stream_loses_trailing_zero() {
        let catalog = VersionCatalog::from_yaml_str(
            "versions:\n  zed:\n    modules:\n      python: 3.10\n      ruby: \"3.10\"\n      nodejs: 2.0\n",
            Path::new("centos.yaml"),
        )
        .unwrap();
        let modules = &catalog.version("zed").unwrap().modules;
        let streams: Vec<(&str, &str)> = modules
            .iter()
            .map(|(name, stream)| (name.as_str(), stream.as_str()))
            .collect();
        assert_eq!(
            streams,
            vec![("python", "3.1"), ("ruby", "3.10"), ("nodejs", "2.0")]
        );
    }

    #[test]
    fn test_parse_centos_catalog() {
        let catalog = centos_catalog();
        assert_eq!(catalog.mirror_for("centos"), Some("http://mirror.centos.org"));
        assert_eq!(catalog.distros["centos"].versions, vec!["8-stream"]);

        let master = catalog.version("master").unwrap();
        assert_eq!(master.distros, vec!["centos8-stream"]);
        let families: Vec<&str> = master.repos.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(families, vec!["centos8-stream", "ceph", "delorean"]);
        assert_eq!(
            master.repo_family("delorean").unwrap(),
            &["current-tripleo".to_string(), "deps".to_string()]
        );
        assert_eq!(
            master.modules,
            vec![
                ("container-tools".to_string(), "rhel8".to_string()),
                ("virt".to_string(), "rhel".to_string()),
                ("python36".to_string(), "3.6".to_string()),
            ]
        );
    }

    #[test]
    fn test_aliased_version_matches_anchor() {
        let catalog = centos_catalog();
        assert_eq!(catalog.version("wallaby"), catalog.version("master"));
    }

    #[test]
    fn test_numeric_values_coerced_to_strings() {
        let catalog = rhel_catalog();
        assert_eq!(catalog.distros["redhat"].versions, vec!["8.2"]);
        let entry = catalog.version("16.1").unwrap();
        assert_eq!(entry.modules[0], ("container-tools".to_string(), "2.0".to_string()));
        assert_eq!(entry.modules[2], ("python36".to_string(), "3.6".to_string()));
    }

    #[test]
    fn test_unquoted_numeric_version_key() {
        let raw = "versions:\n  17.0:\n    distros: [rhel9.0]\n";
        let catalog = VersionCatalog::from_yaml_str(raw, Path::new("x.yaml")).unwrap();
        assert!(catalog.version("17.0").is_some());
    }

    #[test]
    fn test_entry_without_distros_supports_nothing() {
        let raw = "versions:\n  bare:\n    repos:\n      delorean: [deps]\n";
        let catalog = VersionCatalog::from_yaml_str(raw, Path::new("x.yaml")).unwrap();
        let entry = catalog.version("bare").unwrap();
        assert!(entry.distros.is_empty());
        assert!(!entry.supports("centos8-stream"));
    }

    #[test]
    fn test_supports_exact_and_prefix() {
        let entry = VersionEntry {
            distros: vec!["rhel8".to_string(), "centos8-stream".to_string()],
            ..Default::default()
        };
        assert!(entry.supports("rhel8.2"));
        assert!(entry.supports("rhel8"));
        assert!(entry.supports("centos8-stream"));
        assert!(!entry.supports("rhel80"));
        assert!(!entry.supports("centos8"));
    }

    #[test]
    fn test_invalid_yaml_is_catalog_error() {
        let err = VersionCatalog::from_yaml_str("versions: [unclosed", Path::new("bad.yaml"))
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Catalog { .. }));
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(float_to_string(2.0), "2.0");
        assert_eq!(float_to_string(3.6), "3.6");
        assert_eq!(float_to_string(10.0), "10.0");
    }

    #[test]
    fn test_search_path_first_hit_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("centos.yaml"), CENTOS_DATA).unwrap();
        fs::write(first.path().join("rhel.yaml"), RHEL_DATA).unwrap();
        fs::write(second.path().join("rhel.yaml"), "versions: {}\n").unwrap();

        let search = CatalogSearchPath::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(
            search.locate("centos").unwrap(),
            second.path().join("centos.yaml")
        );
        let rhel = search.load("rhel").unwrap();
        assert!(rhel.version("16.1").is_some());
    }

    #[test]
    fn test_search_path_miss_is_distro_not_supported() {
        let dir = TempDir::new().unwrap();
        let search = CatalogSearchPath::new(vec![dir.path().to_path_buf()]);
        let err = search.locate("foo").unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::DistroNotSupported { ref distro } if distro == "foo"
        ));
    }

    #[test]
    fn test_shipped_catalogs_parse() {
        let centos = VersionCatalog::from_yaml_str(
            include_str!("../data/centos.yaml"),
            Path::new("data/centos.yaml"),
        )
        .unwrap();
        assert_eq!(centos.version("zed"), centos.version("master"));
        assert!(centos.version("wallaby").unwrap().supports("centos8-stream"));
        assert_eq!(
            centos.mirror_for("centos-stream"),
            Some("http://mirror.stream.centos.org")
        );

        let rhel = VersionCatalog::from_yaml_str(
            include_str!("../data/rhel.yaml"),
            Path::new("data/rhel.yaml"),
        )
        .unwrap();
        assert!(rhel.version("17.0").unwrap().supports("rhel9.0"));
        assert!(rhel.version("17.0").unwrap().modules.is_empty());
    }
}
