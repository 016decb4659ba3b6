//! Tool configuration.
//!
//! Read from `/etc/rhos-bootstrap/config.toml` when present. Every key is
//! optional; anything not set falls back to the built-in defaults below.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BootstrapError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/rhos-bootstrap/config.toml";
pub const YUM_REPO_BASE_DIR: &str = "/etc/yum.repos.d";
pub const DEFAULT_CLIENT_PACKAGE: &str = "python3-tripleoclient";

/// Repo families expanded after the distro-specific list, in this order.
pub const DEFAULT_OTHER_REPO_FAMILIES: &[&str] = &[
    "ansible",
    "ceph",
    "delorean",
    "openstack",
    "virt",
    "satellite",
    "openvswitch",
];

pub const DEFAULT_MIRRORS: &[(&str, &str)] = &[
    ("fedora", "https://mirrors.fedoraproject.org"),
    ("centos", "http://mirror.centos.org"),
    ("centos-stream", "http://mirror.stream.centos.org"),
    ("ubi", "http://mirror.centos.org"),
    ("rhel", "https://trunk.rdoproject.org"),
    ("rdo", "https://trunk.rdoproject.org"),
];

/// Built-in mirror for `key`; unknown keys fall back to the RDO trunk.
pub fn default_mirror(key: &str) -> &'static str {
    DEFAULT_MIRRORS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or("https://trunk.rdoproject.org", |(_, url)| *url)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    repo_dir: Option<PathBuf>,
    data_dirs: Option<Vec<PathBuf>>,
    other_repo_families: Option<Vec<String>>,
    mirrors: Option<BTreeMap<String, String>>,
    client_package: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Directory `.repo` files are written to.
    pub repo_dir: PathBuf,
    /// Extra catalog directories, searched before the built-in ones.
    pub data_dirs: Vec<PathBuf>,
    pub other_repo_families: Vec<String>,
    pub mirrors: BTreeMap<String, String>,
    /// Mirror keys set explicitly in the config file.
    pub mirror_overrides: Vec<String>,
    pub client_package: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from(YUM_REPO_BASE_DIR),
            data_dirs: Vec::new(),
            other_repo_families: DEFAULT_OTHER_REPO_FAMILIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mirrors: DEFAULT_MIRRORS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            mirror_overrides: Vec::new(),
            client_package: DEFAULT_CLIENT_PACKAGE.to_string(),
        }
    }
}

impl BootstrapConfig {
    /// Load the config at `path`, or the default location when `path` is None.
    ///
    /// A missing default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !config_path.is_file() {
            if required {
                return Err(BootstrapError::Config {
                    path: config_path,
                    detail: "file does not exist".to_string(),
                });
            }
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&config_path)
            .map_err(|e| BootstrapError::io(&config_path, e))?;
        Self::from_toml_str(&raw, &config_path)
    }

    pub fn from_toml_str(raw: &str, config_path: &Path) -> Result<Self> {
        let parsed: ConfigToml = toml::from_str(raw).map_err(|e| BootstrapError::Config {
            path: config_path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let mut config = Self::default();
        if let Some(repo_dir) = parsed.repo_dir {
            config.repo_dir = repo_dir;
        }
        if let Some(data_dirs) = parsed.data_dirs {
            config.data_dirs = data_dirs;
        }
        if let Some(families) = parsed.other_repo_families {
            let families: Vec<String> = families
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            if families.is_empty() {
                return Err(BootstrapError::Config {
                    path: config_path.to_path_buf(),
                    detail: "other_repo_families must not be empty".to_string(),
                });
            }
            config.other_repo_families = families;
        }
        if let Some(mirrors) = parsed.mirrors {
            for (key, url) in mirrors {
                config.mirror_overrides.push(key.clone());
                config
                    .mirrors
                    .insert(key, url.trim_end_matches('/').to_string());
            }
        }
        if let Some(client_package) = parsed.client_package {
            config.client_package = client_package;
        }
        Ok(config)
    }

    pub fn mirror(&self, key: &str) -> Option<&str> {
        self.mirrors.get(key).map(String::as_str)
    }

    pub fn is_mirror_overridden(&self, key: &str) -> bool {
        self.mirror_overrides.iter().any(|k| k == key)
    }
}
