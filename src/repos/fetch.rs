//! HTTP retrieval of remote `.repo` files.
//!
//! One attempt per URL. Non-success status codes are errors.

use tracing::debug;

use crate::error::{BootstrapError, Result};

/// Fetches the body of a remote repo definition.
pub trait RepoFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking reqwest client. No request timeout is set.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<std::time::Duration>)
            .user_agent(concat!("rhos-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BootstrapError::Fetch {
                url: String::new(),
                detail: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl RepoFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        debug!("fetching {}", url);
        let fetch_err = |detail: String| BootstrapError::Fetch {
            url: url.to_string(),
            detail,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        response
            .text()
            .map_err(|e| fetch_err(format!("failed to read response: {e}")))
    }
}
