use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::DirectorySource;
use crate::error::{DirectoryError, Result};

/// Read-only HTTP(S) client for the relay directory endpoint.
pub struct HttpDirectorySource {
    client: reqwest::Client,
    url: String,
}

impl HttpDirectorySource {
    pub const DEFAULT_URL: &'static str = "https://api.mullvad.net/www/relays/wireguard/";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url: String = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("relayr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| DirectoryError::Request {
                url: url.clone(),
                source,
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DirectorySource for HttpDirectorySource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        debug!("Requesting relay directory from {}", self.url);

        let request_failed = |source: reqwest::Error| DirectoryError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_failed)?;
        debug!("Directory response: {} bytes", body.len());
        Ok(body.to_vec())
    }
}
