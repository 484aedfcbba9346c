//! Configuration types for porkddns
//!
//! A [`DdnsConfig`] is loaded once per invocation and handed to every
//! component constructor. Nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Label that designates the bare domain
pub const APEX_LABEL: &str = "@";

/// Default registrar API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.porkbun.com/api/json/v3";

/// Default IP echo endpoint
pub const DEFAULT_IP_URL: &str = "http://ipinfo.io/ip";

/// Default state file location
pub const DEFAULT_STATE_PATH: &str = "last_ip.txt";

/// Main porkddns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Domain whose records are managed (e.g., "example.com")
    pub domain: String,

    /// Registrar credentials and client settings
    pub registrar: RegistrarConfig,

    /// IP echo settings
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Where the last applied IP is kept
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// DNS records to manage, in update order
    pub records: Vec<RecordSpec>,

    /// Resolve and match records but never edit them or persist state
    #[serde(default)]
    pub dry_run: bool,
}

impl DdnsConfig {
    /// Create a configuration with default IP source and state store
    pub fn new(domain: impl Into<String>, registrar: RegistrarConfig) -> Self {
        Self {
            domain: domain.into(),
            registrar,
            ip_source: IpSourceConfig::default(),
            state_store: StateStoreConfig::default(),
            records: Vec::new(),
            dry_run: false,
        }
    }

    /// Append a record to manage
    pub fn with_record(mut self, record: RecordSpec) -> Self {
        self.records.push(record);
        self
    }

    /// Replace the IP source settings
    pub fn with_ip_source(mut self, ip_source: IpSourceConfig) -> Self {
        self.ip_source = ip_source;
        self
    }

    /// Replace the state store settings
    pub fn with_state_store(mut self, state_store: StateStoreConfig) -> Self {
        self.state_store = state_store;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.domain)?;

        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }
        for record in &self.records {
            record.validate()?;
        }

        self.registrar.validate()?;
        self.ip_source.validate()?;
        self.state_store.validate()?;

        Ok(())
    }
}

/// Registrar credentials and client settings
///
/// The Debug implementation never prints the credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Registrar API key
    pub api_key: String,

    /// Registrar secret API key
    pub secret_api_key: String,

    /// API base URL, without trailing slash
    #[serde(default = "default_api_base")]
    pub base_url: String,

    /// Per-request transport timeout (in seconds)
    #[serde(default = "default_registrar_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per call while the response body fails to decode
    #[serde(default = "default_max_attempts")]
    pub decode_max_attempts: u32,

    /// Delay between decode retries (in seconds)
    #[serde(default = "default_decode_retry_delay_secs")]
    pub decode_retry_delay_secs: u64,
}

impl RegistrarConfig {
    /// Create registrar settings with default endpoint and retry bounds
    pub fn new(api_key: impl Into<String>, secret_api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_api_key: secret_api_key.into(),
            base_url: default_api_base(),
            timeout_secs: default_registrar_timeout_secs(),
            decode_max_attempts: default_max_attempts(),
            decode_retry_delay_secs: default_decode_retry_delay_secs(),
        }
    }

    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Retry policy applied when a response body fails to decode
    pub fn decode_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.decode_max_attempts,
            Duration::from_secs(self.decode_retry_delay_secs),
        )
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the registrar settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.is_empty() {
            return Err(crate::Error::config("Registrar API key cannot be empty"));
        }
        if self.secret_api_key.is_empty() {
            return Err(crate::Error::config("Registrar secret API key cannot be empty"));
        }
        validate_url("Registrar base URL", &self.base_url)?;
        if self.decode_max_attempts == 0 {
            return Err(crate::Error::config("Registrar decode attempts must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Registrar timeout must be > 0"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("api_key", &"<REDACTED>")
            .field("secret_api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("decode_max_attempts", &self.decode_max_attempts)
            .field("decode_retry_delay_secs", &self.decode_retry_delay_secs)
            .finish()
    }
}

/// IP echo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL that answers with the caller's address as plain text
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Per-request transport timeout (in seconds)
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts while the endpoint cannot be reached
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between connection retries (in seconds)
    #[serde(default = "default_ip_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl IpSourceConfig {
    /// Retry policy applied to connection failures
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("IP source URL", &self.url)?;
        if self.max_attempts == 0 {
            return Err(crate::Error::config("IP source attempts must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP source timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            timeout_secs: default_ip_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_ip_retry_delay_secs(),
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// Plain-text file holding the last applied IP
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        StateStoreConfig::File {
            path: DEFAULT_STATE_PATH.to_string(),
        }
    }
}

/// A DNS record to keep pointed at the current address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Subdomain label, or "@" for the bare domain
    pub name: String,

    /// Record type (e.g., "A" or "AAAA")
    #[serde(default = "default_record_type")]
    pub record_type: String,
}

impl RecordSpec {
    /// Create a new record specification
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
        }
    }

    /// Record at the bare domain
    pub fn apex(record_type: impl Into<String>) -> Self {
        Self::new(APEX_LABEL, record_type)
    }

    /// Whether this record sits at the bare domain
    pub fn is_apex(&self) -> bool {
        self.name == APEX_LABEL
    }

    /// Fully-qualified name as the registrar lists it
    pub fn fqdn(&self, domain: &str) -> String {
        if self.is_apex() {
            domain.to_string()
        } else {
            format!("{}.{}", self.name, domain)
        }
    }

    /// Relative name expected by the registrar's edit call (empty for apex)
    pub fn update_label(&self) -> &str {
        if self.is_apex() { "" } else { &self.name }
    }

    /// Validate the record specification
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.record_type.is_empty()
            || !self.record_type.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(crate::Error::config(format!(
                "Invalid record type '{}' for record '{}'",
                self.record_type, self.name
            )));
        }
        if self.is_apex() {
            return Ok(());
        }
        validate_domain_name(&self.name).map_err(|_| {
            crate::Error::config(format!(
                "Invalid record label '{}'. Use '@' for the bare domain.",
                self.name
            ))
        })
    }
}

/// Validate that a string is a plausible domain name
///
/// Basic RFC 1035 checks: total length, label length, characters, hyphens.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // Underscores appear in service labels such as _acme-challenge
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*')
        {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn validate_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_max_attempts() -> u32 {
    10
}

fn default_ip_retry_delay_secs() -> u64 {
    60
}

fn default_decode_retry_delay_secs() -> u64 {
    1
}

fn default_ip_timeout_secs() -> u64 {
    10
}

fn default_registrar_timeout_secs() -> u64 {
    30
}
