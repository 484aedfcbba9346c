//! Error types for porkddns
//!
//! Every fatal condition of a reconciliation pass has its own variant so the
//! invoker can pick an exit code without inspecting message text.

use thiserror::Error;

/// Result type alias for porkddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for porkddns
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport could not reach the remote end (connect failure or timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body could not be decoded as structured data
    #[error("Malformed response: {0}")]
    Decode(String),

    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A configured record has no counterpart at the registrar
    #[error("Record {name} ({record_type}) not found in {domain}")]
    RecordNotFound {
        /// Fully-qualified name that was looked up
        name: String,
        /// Record type that was looked up
        record_type: String,
        /// Domain whose snapshot was searched
        domain: String,
    },

    /// A retried operation never succeeded
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    RetryExhausted {
        /// Human-readable operation name
        operation: String,
        /// Number of attempts made
        attempts: u32,
        /// The error returned by the final attempt
        #[source]
        source: Box<Error>,
    },

    /// The registrar rejected one or more record updates
    #[error("{} of {total} record update(s) failed: {}", .failed.len(), .failed.join(", "))]
    RecordsFailed {
        /// Labels of the records whose update was rejected
        failed: Vec<String>,
        /// Number of records attempted in the pass
        total: usize,
    },

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(
        name: impl Into<String>,
        record_type: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self::RecordNotFound {
            name: name.into(),
            record_type: record_type.into(),
            domain: domain.into(),
        }
    }

    /// Wrap the last error of a retried operation
    pub fn retry_exhausted(operation: impl Into<String>, attempts: u32, source: Error) -> Self {
        Self::RetryExhausted {
            operation: operation.into(),
            attempts,
            source: Box::new(source),
        }
    }

    /// True for transport failures where no connection was established
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// True when a response arrived but could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
