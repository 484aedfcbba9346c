// # porkddns - Porkbun Dynamic DNS Updater
//
// Runs exactly one reconciliation pass and exits. Schedule it with cron or a
// systemd timer.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the IP source, registrar client and state store
// 4. Mapping the pass outcome to an exit code
//
// All DDNS logic lives in porkddns-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Registrar
// - `PORKDDNS_API_KEY`: Porkbun API key (required)
// - `PORKDDNS_SECRET_API_KEY`: Porkbun secret API key (required)
// - `PORKDDNS_API_BASE`: API base URL
// - `PORKDDNS_DECODE_MAX_ATTEMPTS`: Attempts while responses fail to decode
//
// ### Records
// - `PORKDDNS_DOMAIN`: Domain whose records are managed (required)
// - `PORKDDNS_RECORDS`: Comma-separated labels, "@" for the bare domain (required)
// - `PORKDDNS_RECORD_TYPE`: Record type for every label (default: A)
//
// ### IP Source
// - `PORKDDNS_IP_URL`: Plain-text IP echo URL
// - `PORKDDNS_IP_MAX_ATTEMPTS`: Attempts while the echo service is unreachable
// - `PORKDDNS_IP_RETRY_DELAY_SECS`: Delay between those attempts
//
// ### State Store
// - `PORKDDNS_STATE_STORE_TYPE`: Type of state store (file, memory)
// - `PORKDDNS_STATE_PATH`: Path to state file (for file store)
//
// ### Misc
// - `PORKDDNS_MODE`: live or dry-run
// - `PORKDDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export PORKDDNS_API_KEY=pk1_...
// export PORKDDNS_SECRET_API_KEY=sk1_...
// export PORKDDNS_DOMAIN=example.com
// export PORKDDNS_RECORDS=@,www
// export PORKDDNS_STATE_PATH=/var/lib/porkddns/last_ip.txt
//
// porkddns
// ```

use anyhow::{Context, Result};
use porkddns_core::config::{
    DEFAULT_API_BASE, DEFAULT_IP_URL, DEFAULT_STATE_PATH, DdnsConfig, IpSourceConfig, RecordSpec,
    RegistrarConfig, StateStoreConfig,
};
use porkddns_core::logging::{RedactingLogger, SecretSet};
use porkddns_core::{Error, PassOutcome, Reconciler, RecordStatus, state};
use porkddns_ip_http::HttpIpSource;
use porkddns_provider_porkbun::PorkbunProvider;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the different pass outcomes
///
/// 0 and 1 follow the usual conventions. 3 to 6 let cron wrappers tell
/// fatal categories apart without parsing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// No change, all records updated, or dry run
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (state store, HTTP, IP source, registrar)
    RuntimeError = 2,
    /// The registrar rejected the credentials
    AuthenticationError = 3,
    /// A configured record does not exist at the registrar
    RecordNotFound = 4,
    /// A retried operation never succeeded
    RetryExhausted = 5,
    /// One or more record updates were rejected
    RecordsFailed = 6,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&Error> for DdnsExitCode {
    fn from(error: &Error) -> Self {
        match error {
            Error::Config(_) => DdnsExitCode::ConfigError,
            Error::Authentication(_) => DdnsExitCode::AuthenticationError,
            Error::RecordNotFound { .. } => DdnsExitCode::RecordNotFound,
            Error::RetryExhausted { .. } => DdnsExitCode::RetryExhausted,
            Error::RecordsFailed { .. } => DdnsExitCode::RecordsFailed,
            _ => DdnsExitCode::RuntimeError,
        }
    }
}

/// Application configuration
struct Config {
    api_key: String,
    secret_api_key: String,
    domain: String,
    records: Vec<String>,
    record_type: String,
    api_base: String,
    ip_url: String,
    ip_max_attempts: u32,
    ip_retry_delay_secs: u64,
    decode_max_attempts: u32,
    state_store_type: String,
    state_path: String,
    mode: String,
    log_level: String,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<REDACTED>")
            .field("secret_api_key", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("records", &self.records)
            .field("record_type", &self.record_type)
            .field("api_base", &self.api_base)
            .field("ip_url", &self.ip_url)
            .field("state_store_type", &self.state_store_type)
            .field("state_path", &self.state_path)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            api_key: required(&lookup, "PORKDDNS_API_KEY")?,
            secret_api_key: required(&lookup, "PORKDDNS_SECRET_API_KEY")?,
            domain: required(&lookup, "PORKDDNS_DOMAIN")?.trim().to_string(),
            records: required(&lookup, "PORKDDNS_RECORDS")?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            record_type: or_default("PORKDDNS_RECORD_TYPE", "A").trim().to_uppercase(),
            api_base: or_default("PORKDDNS_API_BASE", DEFAULT_API_BASE),
            ip_url: or_default("PORKDDNS_IP_URL", DEFAULT_IP_URL),
            ip_max_attempts: number(&lookup, "PORKDDNS_IP_MAX_ATTEMPTS", 10)?,
            ip_retry_delay_secs: number(&lookup, "PORKDDNS_IP_RETRY_DELAY_SECS", 60)?,
            decode_max_attempts: number(&lookup, "PORKDDNS_DECODE_MAX_ATTEMPTS", 10)?,
            state_store_type: or_default("PORKDDNS_STATE_STORE_TYPE", "file"),
            state_path: or_default("PORKDDNS_STATE_PATH", DEFAULT_STATE_PATH),
            mode: or_default("PORKDDNS_MODE", "live"),
            log_level: or_default("PORKDDNS_LOG_LEVEL", "info"),
        })
    }

    /// Validate the configuration
    ///
    /// Covers what the environment layer owns: presence, placeholders, numeric
    /// ranges and enumerations. Domain and record syntax is checked by
    /// `DdnsConfig::validate` when the core configuration is built.
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("PORKDDNS_API_KEY", &self.api_key),
            ("PORKDDNS_SECRET_API_KEY", &self.secret_api_key),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty. Set it via: export {}=...", name, name);
            }

            // Check for obvious placeholder values (common mistake)
            let lower = value.to_lowercase();
            if lower.contains("your_")
                || lower.contains("replace_me")
                || lower == "changeme"
                || lower == "xxx"
            {
                anyhow::bail!(
                    "{} appears to be a placeholder. \
                    Use the key generated in your Porkbun account.",
                    name
                );
            }
        }

        if self.records.is_empty() {
            anyhow::bail!(
                "PORKDDNS_RECORDS must contain at least one label. \
                Set it via: export PORKDDNS_RECORDS=@,www"
            );
        }

        if self.record_type.is_empty() {
            anyhow::bail!("PORKDDNS_RECORD_TYPE cannot be empty");
        }

        if !(1..=50).contains(&self.ip_max_attempts) {
            anyhow::bail!(
                "PORKDDNS_IP_MAX_ATTEMPTS must be between 1 and 50. Got: {}",
                self.ip_max_attempts
            );
        }

        if self.ip_retry_delay_secs > 3600 {
            anyhow::bail!(
                "PORKDDNS_IP_RETRY_DELAY_SECS must be between 0 and 3600 seconds. Got: {}",
                self.ip_retry_delay_secs
            );
        }

        if !(1..=50).contains(&self.decode_max_attempts) {
            anyhow::bail!(
                "PORKDDNS_DECODE_MAX_ATTEMPTS must be between 1 and 50. Got: {}",
                self.decode_max_attempts
            );
        }

        match self.state_store_type.as_str() {
            "file" => {
                if self.state_path.trim().is_empty() {
                    anyhow::bail!(
                        "PORKDDNS_STATE_PATH cannot be empty when PORKDDNS_STATE_STORE_TYPE=file"
                    );
                }
            }
            "memory" => {}
            _ => anyhow::bail!(
                "PORKDDNS_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_store_type
            ),
        }

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "PORKDDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        if parse_log_level(&self.log_level).is_none() {
            anyhow::bail!(
                "PORKDDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        self.mode == "dry-run"
    }

    /// Build the core configuration
    fn to_ddns_config(&self) -> Result<DdnsConfig> {
        let mut registrar = RegistrarConfig::new(&self.api_key, &self.secret_api_key)
            .with_base_url(&self.api_base);
        registrar.decode_max_attempts = self.decode_max_attempts;

        let ip_source = IpSourceConfig {
            url: self.ip_url.clone(),
            max_attempts: self.ip_max_attempts,
            retry_delay_secs: self.ip_retry_delay_secs,
            ..IpSourceConfig::default()
        };

        let state_store = match self.state_store_type.as_str() {
            "memory" => StateStoreConfig::Memory,
            _ => StateStoreConfig::File {
                path: self.state_path.clone(),
            },
        };

        let config = self
            .records
            .iter()
            .fold(DdnsConfig::new(&self.domain, registrar), |config, label| {
                config.with_record(RecordSpec::new(label, &self.record_type))
            })
            .with_ip_source(ip_source)
            .with_state_store(state_store)
            .with_dry_run(self.is_dry_run());

        config.validate()?;
        Ok(config)
    }
}

/// Look up a variable that has no default
fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("{} is required", key))
}

/// Look up and parse a numeric variable
fn number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer. Got: '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let ddns_config = match config.to_ddns_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting porkddns");
    info!(
        "Configuration loaded: {} record(s) for {}{}",
        ddns_config.records.len(),
        ddns_config.domain,
        if ddns_config.dry_run { " (dry run)" } else { "" }
    );

    // A single pass needs no worker threads
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(run_once(ddns_config));
    debug!("Exiting with code {}", code as u8);
    code.into()
}

/// Wire the components and run one pass
async fn run_once(config: DdnsConfig) -> DdnsExitCode {
    let logger = RedactingLogger::tracing(SecretSet::from_registrar(&config.registrar));

    let reconciler = match build_reconciler(&config, logger.clone()) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            logger.error(format!("Startup error: {}", e));
            return DdnsExitCode::from(&e);
        }
    };

    match reconciler.run_pass().await {
        Ok(outcome) => {
            report(&logger, &outcome);
            DdnsExitCode::Success
        }
        // Already logged by the reconciler
        Err(e) => DdnsExitCode::from(&e),
    }
}

fn build_reconciler(config: &DdnsConfig, logger: RedactingLogger) -> porkddns_core::Result<Reconciler> {
    let ip_source = HttpIpSource::from_config(&config.ip_source)?;
    let provider = PorkbunProvider::from_config(&config.registrar)?;
    let state_store = state::from_config(&config.state_store);

    Reconciler::new(
        Box::new(ip_source),
        Box::new(provider),
        state_store,
        logger,
        config,
    )
}

fn report(logger: &RedactingLogger, outcome: &PassOutcome) {
    match outcome {
        PassOutcome::Unchanged { .. } => {}
        PassOutcome::Applied { ip, outcomes } => {
            logger.info(format!(
                "Pass complete: {} record(s) point to {}",
                outcomes.len(),
                ip
            ));
        }
        PassOutcome::DryRun { ip, planned } => {
            let pending = planned
                .iter()
                .filter(|o| o.status == RecordStatus::Planned)
                .count();
            logger.info(format!(
                "[DRY-RUN] Pass complete: {} of {} record(s) would be updated to {}",
                pending,
                planned.len(),
                ip
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PORKDDNS_API_KEY", "pk1_0123456789abcdef"),
            ("PORKDDNS_SECRET_API_KEY", "sk1_fedcba9876543210"),
            ("PORKDDNS_DOMAIN", "example.com"),
            ("PORKDDNS_RECORDS", "@, www ,,api"),
        ]
    }

    fn load(extra: &[(&'static str, &'static str)]) -> Result<Config> {
        let mut pairs = minimal();
        pairs.extend_from_slice(extra);
        Config::from_lookup(env_from(&pairs))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.records, vec!["@", "www", "api"]);
        assert_eq!(config.record_type, "A");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.ip_url, DEFAULT_IP_URL);
        assert_eq!(config.ip_max_attempts, 10);
        assert_eq!(config.ip_retry_delay_secs, 60);
        assert_eq!(config.decode_max_attempts, 10);
        assert_eq!(config.state_store_type, "file");
        assert_eq!(config.state_path, "last_ip.txt");
        assert!(!config.is_dry_run());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Config::from_lookup(env_from(&[("PORKDDNS_API_KEY", "pk1_abc")])).unwrap_err();
        assert!(err.to_string().contains("PORKDDNS_SECRET_API_KEY is required"));
    }

    #[test]
    fn test_unparseable_number() {
        let err = load(&[("PORKDDNS_IP_MAX_ATTEMPTS", "ten")]).unwrap_err();
        assert!(err.to_string().contains("PORKDDNS_IP_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_range_validation() {
        assert!(load(&[("PORKDDNS_IP_MAX_ATTEMPTS", "0")]).unwrap().validate().is_err());
        assert!(load(&[("PORKDDNS_IP_MAX_ATTEMPTS", "51")]).unwrap().validate().is_err());
        assert!(load(&[("PORKDDNS_IP_RETRY_DELAY_SECS", "3601")]).unwrap().validate().is_err());
        assert!(load(&[("PORKDDNS_IP_RETRY_DELAY_SECS", "0")]).unwrap().validate().is_ok());
        assert!(load(&[("PORKDDNS_DECODE_MAX_ATTEMPTS", "0")]).unwrap().validate().is_err());
    }

    #[test]
    fn test_enumerations() {
        assert!(load(&[("PORKDDNS_MODE", "sometimes")]).unwrap().validate().is_err());
        assert!(load(&[("PORKDDNS_STATE_STORE_TYPE", "redis")]).unwrap().validate().is_err());
        assert!(load(&[("PORKDDNS_LOG_LEVEL", "loud")]).unwrap().validate().is_err());
        assert!(load(&[("PORKDDNS_LOG_LEVEL", "DEBUG")]).unwrap().validate().is_ok());
    }

    #[test]
    fn test_placeholder_credentials_rejected() {
        let config = load(&[("PORKDDNS_API_KEY", "your_api_key")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_empty_records_rejected() {
        let config = load(&[("PORKDDNS_RECORDS", " , ")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_ddns_config() {
        let config = load(&[
            ("PORKDDNS_RECORD_TYPE", "aaaa"),
            ("PORKDDNS_MODE", "dry-run"),
            ("PORKDDNS_STATE_STORE_TYPE", "memory"),
            ("PORKDDNS_DECODE_MAX_ATTEMPTS", "3"),
        ])
        .unwrap();

        let ddns = config.to_ddns_config().unwrap();

        assert_eq!(ddns.domain, "example.com");
        assert_eq!(ddns.records.len(), 3);
        assert!(ddns.records[0].is_apex());
        assert_eq!(ddns.records[1], RecordSpec::new("www", "AAAA"));
        assert!(ddns.dry_run);
        assert_eq!(ddns.state_store, StateStoreConfig::Memory);
        assert_eq!(ddns.registrar.decode_max_attempts, 3);
    }

    #[test]
    fn test_invalid_domain_rejected_by_core() {
        let config = load(&[("PORKDDNS_DOMAIN", "bad..example")]).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.to_ddns_config().is_err());
    }

    #[test]
    fn test_debug_redaction_of_core_config() {
        let ddns = load(&[]).unwrap().to_ddns_config().unwrap();
        let debug_str = format!("{:?}", ddns);
        assert!(!debug_str.contains("pk1_0123456789abcdef"));
        assert!(!debug_str.contains("sk1_fedcba9876543210"));
    }

    #[test]
    fn test_exit_code_mapping() {
        let code = |e: Error| DdnsExitCode::from(&e) as u8;

        assert_eq!(code(Error::config("x")), 1);
        assert_eq!(code(Error::state_store("x")), 2);
        assert_eq!(code(Error::http("x")), 2);
        assert_eq!(code(Error::auth("x")), 3);
        assert_eq!(code(Error::record_not_found("www.example.com", "A", "example.com")), 4);
        assert_eq!(code(Error::retry_exhausted("ping", 10, Error::decode("x"))), 5);
        assert_eq!(
            code(Error::RecordsFailed {
                failed: vec!["www".to_string()],
                total: 2
            }),
            6
        );
        assert_eq!(DdnsExitCode::Success as u8, 0);
    }
}
