//! Host distribution identity.
//!
//! Identity is three raw fields (`ID`, `VERSION_ID`, `NAME`) taken from
//! `/etc/os-release` unless supplied explicitly. Everything else, including
//! the normalized id used to key the version catalog, is derived from them.

pub mod resolver;

pub use resolver::Resolver;

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{BootstrapError, Result};

pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Distro ids whose repositories are managed by an entitlement tool.
const ENTITLEMENT_MANAGED_IDS: &[&str] = &["rhel"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistributionIdentity {
    pub id: String,
    pub version_id: String,
    pub name: String,
}

impl DistributionIdentity {
    pub fn new(
        id: impl Into<String>,
        version_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            version_id: version_id.into(),
            name: name.into(),
        }
    }

    /// Build an identity from explicit overrides, filling any missing field
    /// from `/etc/os-release`. The file is only read when something is missing.
    pub fn detect(
        id: Option<&str>,
        version_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self> {
        if let (Some(id), Some(version_id), Some(name)) = (id, version_id, name) {
            return Ok(Self::new(id, version_id, name));
        }
        let host = Self::from_os_release_file(Path::new(OS_RELEASE_PATH))?;
        Ok(Self {
            id: id.map(str::to_string).unwrap_or(host.id),
            version_id: version_id.map(str::to_string).unwrap_or(host.version_id),
            name: name.map(str::to_string).unwrap_or(host.name),
        })
    }

    pub fn from_os_release_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BootstrapError::io(path, e))?;
        Self::from_os_release(&content)
    }

    /// Parse `KEY=value` lines, honouring shell-style quoting.
    pub fn from_os_release(content: &str) -> Result<Self> {
        let mut id = None;
        let mut version_id = None;
        let mut name = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim());
            match key.trim() {
                "ID" => id = Some(value),
                "VERSION_ID" => version_id = Some(value),
                "NAME" => name = Some(value),
                _ => {}
            }
        }

        let missing = |field: &str| BootstrapError::OsRelease {
            detail: format!("{field} missing from os-release"),
        };
        Ok(Self {
            id: id.ok_or_else(|| missing("ID"))?,
            version_id: version_id.ok_or_else(|| missing("VERSION_ID"))?,
            name: name.ok_or_else(|| missing("NAME"))?,
        })
    }

    /// Substring of `version_id` before the first `.`.
    pub fn major_version(&self) -> &str {
        self.version_id
            .split_once('.')
            .map_or(self.version_id.as_str(), |(major, _)| major)
    }

    /// Everything after the first `.`, empty when there is none
    /// (CentOS Stream has no minor version).
    pub fn minor_version(&self) -> &str {
        self.version_id
            .split_once('.')
            .map_or("", |(_, minor)| minor)
    }

    pub fn is_stream(&self) -> bool {
        self.name.to_lowercase().contains("stream")
    }

    /// `centos8-stream`, `rhel8.2`, `centos8`.
    pub fn normalized_id(&self) -> String {
        let mut normalized = format!("{}{}", self.id, self.major_version());
        let minor = self.minor_version();
        if !minor.is_empty() {
            normalized.push('.');
            normalized.push_str(minor);
        }
        if self.is_stream() {
            normalized.push_str("-stream");
        }
        normalized
    }

    /// `<id><major>`, the distro key used by the build mirrors (`centos8`).
    pub fn build_distro(&self) -> String {
        format!("{}{}", self.id, self.major_version())
    }

    pub fn is_entitlement_managed(&self) -> bool {
        ENTITLEMENT_MANAGED_IDS.contains(&self.id.as_str())
    }

    pub fn major_number(&self) -> Option<u32> {
        self.major_version().parse().ok()
    }
}

impl fmt::Display for DistributionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized_id())
    }
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        value[1..value.len() - 1].replace("\\\"", "\"")
    } else {
        value.to_string()
    }
}
