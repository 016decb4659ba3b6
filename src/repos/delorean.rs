//! RDO trunk ("delorean") repositories.
//!
//! The trunk publishes ready-made `.repo` files per distro and release, so
//! these descriptors fetch the body when constructed and write it verbatim.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{write_repo_file, RepoFetcher};

pub const DEPS_REPO: &str = "deps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    name: String,
    uri: String,
    content: String,
}

impl RemoteRepo {
    /// Fetch `tripleo-delorean-<repo>` for `<distro>-<version>` from `mirror`.
    ///
    /// `deps` maps to `delorean-deps.repo` at the release root; every other
    /// repo name is a subdirectory holding `delorean.repo`. A failed fetch
    /// means no descriptor is returned.
    pub fn fetch(
        distro: &str,
        version: &str,
        repo: &str,
        mirror: &str,
        fetcher: &dyn RepoFetcher,
    ) -> Result<Self> {
        let uri = delorean_uri(distro, version, repo, mirror);
        let content = fetcher.fetch(&uri)?;
        Ok(Self {
            name: format!("tripleo-delorean-{repo}"),
            uri,
            content,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn save(&self, repo_dir: &Path) -> Result<PathBuf> {
        write_repo_file(repo_dir, &self.name, &self.content)
    }
}

pub fn delorean_uri(distro: &str, version: &str, repo: &str, mirror: &str) -> String {
    let base = format!("{}/{distro}-{version}", mirror.trim_end_matches('/'));
    if repo == DEPS_REPO {
        format!("{base}/delorean-deps.repo")
    } else {
        format!("{base}/{repo}/delorean.repo")
    }
}
