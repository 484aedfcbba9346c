// # HTTP IP Source
//
// This crate provides the IP source used by porkddns: a plain-text echo
// service (by default `http://ipinfo.io/ip`) that answers a GET with the
// caller's public address.
//
// ## Retry
//
// Only failures to reach the service (connect errors and timeouts) are
// retried, up to the configured attempt bound with a fixed delay. An HTTP
// error status or an empty body fails immediately.
//
// ## Usage
//
// ```rust,ignore
// use porkddns_core::config::IpSourceConfig;
// use porkddns_core::traits::IpSource;
// use porkddns_ip_http::HttpIpSource;
//
// let source = HttpIpSource::from_config(&IpSourceConfig::default())?;
// let ip = source.current().await?;
// ```

use porkddns_core::config::IpSourceConfig;
use porkddns_core::retry::{RetryPolicy, retry_with_policy};
use porkddns_core::traits::{IpSource, PublicIp};
use porkddns_core::{Error, Result};

/// HTTP echo-service IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client (carries the per-request timeout)
    client: reqwest::Client,

    /// Bound on connection retries
    retry: RetryPolicy,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `config`: URL, timeout and retry settings
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)` if the HTTP client cannot be built
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            client,
            retry: config.retry_policy(),
        })
    }

    /// URL the address is fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current IP once
    async fn fetch_ip(&self) -> Result<PublicIp> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| classify(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ip_source(format!(
                "{} answered with HTTP {}",
                self.url, status
            )));
        }

        let text = response.text().await.map_err(|e| {
            Error::ip_source(format!("Failed to read response from {}: {}", self.url, e))
        })?;

        let ip = PublicIp::new(&text);
        if ip.is_empty() {
            return Err(Error::ip_source(format!(
                "{} returned an empty body",
                self.url
            )));
        }

        tracing::debug!("{} reported {}", self.url, ip);
        Ok(ip)
    }
}

/// Split transport errors into retryable connection failures and the rest
fn classify(url: &str, e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::connection(format!("Could not reach {}: {}", url, e))
    } else {
        Error::http(format!("Request to {} failed: {}", url, e))
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<PublicIp> {
        retry_with_policy(
            "public IP lookup",
            &self.retry,
            Error::is_connection,
            move || self.fetch_ip(),
        )
        .await
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
