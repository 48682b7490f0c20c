//! HTTP access for artifact downloads and node polling

use crate::error::ClusterError;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Status and body of a node response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Downloads artifacts and queries the running node
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch `url` and write the bytes to `destination`
    async fn download(&self, url: &str, destination: &Path) -> Result<(), ClusterError>;

    /// `GET` a path relative to the node's base URL
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpResponse, ClusterError>;
}

/// [`HttpClient`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    client: Client,
    node_url: String,
    credentials: Option<(String, String)>,
}

impl ReqwestHttp {
    /// Client for a node on localhost.
    ///
    /// With SSL the node serves the demo certificate and requires the demo
    /// admin credentials.
    pub fn for_node(port: u16, enable_ssl: bool) -> Result<Self, ClusterError> {
        let client = Client::builder()
            .user_agent(concat!("ephemeral-cluster/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(enable_ssl)
            .build()
            .map_err(|e| ClusterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let scheme = if enable_ssl { "https" } else { "http" };
        Ok(Self {
            client,
            node_url: format!("{}://localhost:{}", scheme, port),
            credentials: enable_ssl.then(|| ("admin".to_string(), "admin".to_string())),
        })
    }

    pub fn node_url(&self) -> &str {
        &self.node_url
    }
}

#[async_trait]
impl HttpClient for ReqwestHttp {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), ClusterError> {
        let failed = |reason: String| ClusterError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

        // a partial file must never look like a finished download
        let partial = destination.with_extension("part");
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, destination).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), destination.display());
        Ok(())
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpResponse, ClusterError> {
        let url = format!("{}/{}", self.node_url, path.trim_start_matches('/'));
        let mut request = self.client.get(&url).query(query);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClusterError::VersionPollFailed(format!("{}: {}", url, e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClusterError::VersionPollFailed(format!("{}: {}", url, e)))?;
        Ok(HttpResponse { status, body })
    }
}
