// # Redacting Logger
//
// Status lines produced during a pass may quote registrar responses, which can
// echo request fields back. Every line is passed through `redact` before it
// reaches the sink, so neither credential ever leaves the process in clear text.
//
// ## Usage
//
// ```rust
// use porkddns_core::logging::{RedactingLogger, SecretSet, TracingSink};
// use std::sync::Arc;
//
// let secrets = SecretSet::new()
//     .with_secret("pk1_abc", "<api_key>")
//     .with_secret("sk1_def", "<secret_key>");
// let logger = RedactingLogger::new(Arc::new(TracingSink), secrets);
//
// logger.info("Ping response for pk1_abc: SUCCESS");
// ```

use std::sync::Arc;

use tracing::Level;

use crate::config::RegistrarConfig;

/// Placeholder substituted for the registrar API key
pub const API_KEY_PLACEHOLDER: &str = "<api_key>";

/// Placeholder substituted for the registrar secret key
pub const SECRET_KEY_PLACEHOLDER: &str = "<secret_key>";

/// Secret values and the placeholder each one is replaced with
#[derive(Clone, Default)]
pub struct SecretSet {
    entries: Vec<(String, String)>,
}

impl SecretSet {
    /// Create an empty secret set
    pub fn new() -> Self {
        Self::default()
    }

    /// Secret set for the registrar credentials
    pub fn from_registrar(config: &RegistrarConfig) -> Self {
        Self::new()
            .with_secret(&config.api_key, API_KEY_PLACEHOLDER)
            .with_secret(&config.secret_api_key, SECRET_KEY_PLACEHOLDER)
    }

    /// Add a secret; empty values are ignored
    pub fn with_secret(mut self, secret: impl Into<String>, placeholder: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.entries.push((secret, placeholder.into()));
            // Longest first, so a secret containing another is replaced whole
            self.entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        }
        self
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(_, placeholder)| placeholder))
            .finish()
    }
}

/// Replace every occurrence of every secret in `text` with its placeholder
pub fn redact(text: &str, secrets: &SecretSet) -> String {
    let mut out = text.to_string();
    for (secret, placeholder) in &secrets.entries {
        if out.contains(secret.as_str()) {
            out = out.replace(secret.as_str(), placeholder);
        }
    }
    out
}

/// Destination for already-redacted log lines
pub trait LogSink: Send + Sync {
    /// Emit one line at the given level
    fn emit(&self, level: Level, line: &str);
}

/// Sink that forwards lines to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: Level, line: &str) {
        match level {
            Level::ERROR => tracing::error!("{}", line),
            Level::WARN => tracing::warn!("{}", line),
            Level::INFO => tracing::info!("{}", line),
            Level::DEBUG => tracing::debug!("{}", line),
            Level::TRACE => tracing::trace!("{}", line),
        }
    }
}

/// Logger that redacts secrets before handing text to its sink
#[derive(Clone)]
pub struct RedactingLogger {
    sink: Arc<dyn LogSink>,
    secrets: SecretSet,
}

impl RedactingLogger {
    /// Create a logger over `sink` that hides `secrets`
    pub fn new(sink: Arc<dyn LogSink>, secrets: SecretSet) -> Self {
        Self { sink, secrets }
    }

    /// Logger that forwards to `tracing`
    pub fn tracing(secrets: SecretSet) -> Self {
        Self::new(Arc::new(TracingSink), secrets)
    }

    /// Redact and emit a line at `level`
    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        let line = redact(message.as_ref(), &self.secrets);
        self.sink.emit(level, &line);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::ERROR, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::WARN, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::INFO, message);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Level::DEBUG, message);
    }
}

impl std::fmt::Debug for RedactingLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedactingLogger")
            .field("secrets", &self.secrets)
            .finish_non_exhaustive()
    }
}
