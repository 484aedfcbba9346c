// # DNS Provider Trait
//
// Defines the registrar RPC boundary: authenticate, list a domain's records,
// edit one record.
//
// ## Implementations
//
// - Porkbun: `porkddns-provider-porkbun` crate
//
// ## Usage
//
// ```rust,ignore
// use porkddns_core::DnsProvider;
// use porkddns_core::traits::RecordUpdate;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     if !provider.ping().await?.is_success() {
//         anyhow::bail!("bad credentials");
//     }
//
//     let records = provider.list_records("example.com").await?;
//     let www = records.iter().find(|r| r.name == "www.example.com").unwrap();
//
//     provider
//         .update_record("example.com", &RecordUpdate::new(&www.id, "www", "A", "203.0.113.7"))
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Registrar-reported outcome of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    /// The response carried a success status
    Success,
    /// The response carried another status, or none at all
    Failure {
        /// Raw status field, if present
        status: Option<String>,
        /// Registrar message, if present
        message: Option<String>,
    },
}

impl ApiStatus {
    /// Status string the registrar uses for success
    pub const SUCCESS: &'static str = "SUCCESS";

    /// Classify a response's `status` and `message` fields
    ///
    /// Only a present status equal to "SUCCESS" (ASCII case-insensitive) is a
    /// success; a missing status is a failure.
    pub fn from_fields(status: Option<String>, message: Option<String>) -> Self {
        match status {
            Some(s) if s.eq_ignore_ascii_case(Self::SUCCESS) => ApiStatus::Success,
            status => ApiStatus::Failure { status, message },
        }
    }

    /// Whether the registrar reported success
    pub fn is_success(&self) -> bool {
        matches!(self, ApiStatus::Success)
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiStatus::Success => f.write_str(Self::SUCCESS),
            ApiStatus::Failure { status, message } => {
                f.write_str(status.as_deref().unwrap_or("<no status>"))?;
                if let Some(message) = message {
                    write!(f, ": {}", message)?;
                }
                Ok(())
            }
        }
    }
}

/// A DNS record as listed by the registrar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Registrar record ID
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Fully-qualified record name
    pub name: String,

    /// Record type (e.g., "A")
    #[serde(rename = "type")]
    pub record_type: String,

    /// Record content (the address, for A/AAAA records)
    #[serde(default)]
    pub content: String,

    /// Any additional registrar fields (ttl, prio, notes, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl DnsRecord {
    /// Create a record with no extra fields
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            extra: HashMap::new(),
        }
    }
}

/// Arguments of a single record edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Registrar record ID to edit
    pub record_id: String,
    /// Relative record name ("" for the bare domain)
    pub name: String,
    /// Record type
    pub record_type: String,
    /// New content
    pub content: String,
}

impl RecordUpdate {
    /// Create a new record update
    pub fn new(
        record_id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Credentials are supplied to the implementation's constructor, never per call.
///
/// # Failure Semantics
///
/// - Transport failures propagate as errors immediately; the provider does not
///   retry them.
/// - Response bodies that cannot be decoded are retried by the provider up to
///   its configured bound, then surface as `Error::RetryExhausted`.
/// - A decodable response that reports failure is *not* an error for `ping`
///   and `update_record`: it is returned as [`ApiStatus::Failure`] so the caller
///   can fold it into its own outcome.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check the credentials
    async fn ping(&self) -> Result<ApiStatus, crate::Error>;

    /// Fetch every record of `domain` in one call
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: The full snapshot
    /// - `Err(Error::DnsProvider)`: The registrar refused the listing
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Set one record's content
    async fn update_record(
        &self,
        domain: &str,
        update: &RecordUpdate,
    ) -> Result<ApiStatus, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
