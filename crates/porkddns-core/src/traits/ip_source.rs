// # IP Source Trait
//
// Defines the interface for discovering the caller's current public address.
//
// ## Implementations
//
// - HTTP echo service: `porkddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use porkddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Current IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The caller's public address as reported by the echo service
///
/// The text is kept exactly as received (minus surrounding whitespace).
/// It is not parsed; the registrar is the authority on whether it is a
/// valid address. Equality is byte-for-byte on the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicIp(String);

impl PublicIp {
    /// Wrap an address, trimming surrounding whitespace
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_string())
    }

    /// The address text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PublicIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicIp {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Trait for IP source implementations
///
/// # Retry Ownership
///
/// Implementations own their transport retry: `current()` either returns an
/// address or a final error once the configured attempt bound is spent. The
/// reconciler never retries an IP lookup itself.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(PublicIp)`: The current address
    /// - `Err(Error::RetryExhausted)`: The endpoint could not be reached within the bound
    /// - `Err(Error)`: Any other failure
    async fn current(&self) -> Result<PublicIp, crate::Error>;

    /// Name of the source (for logging)
    fn source_name(&self) -> &'static str;
}
