//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles record every call in shared counters so a test can keep a
//! handle after the reconciler has taken ownership of the boxed trait object.

#![allow(dead_code)]

use porkddns_core::config::{DdnsConfig, RecordSpec, RegistrarConfig, StateStoreConfig};
use porkddns_core::error::{Error, Result};
use porkddns_core::logging::{LogSink, RedactingLogger, SecretSet};
use porkddns_core::traits::{
    ApiStatus, DnsProvider, DnsRecord, IpSource, PublicIp, RecordUpdate, StateStore,
};
use porkddns_core::Reconciler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Level;

pub const DOMAIN: &str = "example.com";
pub const API_KEY: &str = "pk1_0123456789abcdef";
pub const SECRET_KEY: &str = "sk1_fedcba9876543210";

/// An IpSource that always reports the same address
#[derive(Clone)]
pub struct FixedIpSource {
    ip: PublicIp,
    calls: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: PublicIp::new(ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times current() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self) -> Result<PublicIp> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip.clone())
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An IpSource whose retries are already exhausted
pub struct UnreachableIpSource;

#[async_trait::async_trait]
impl IpSource for UnreachableIpSource {
    async fn current(&self) -> Result<PublicIp> {
        Err(Error::retry_exhausted(
            "public IP lookup",
            10,
            Error::connection("connection refused"),
        ))
    }

    fn source_name(&self) -> &'static str {
        "unreachable"
    }
}

/// One call observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Ping,
    List(String),
    Update { domain: String, update: RecordUpdate },
}

/// A scripted DnsProvider that logs every call
#[derive(Clone)]
pub struct MockDnsProvider {
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    records: Vec<DnsRecord>,
    ping_status: ApiStatus,
    /// Labels (as passed to update_record) whose edits are refused
    rejected_labels: Vec<String>,
    rejection_message: String,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            records,
            ping_status: ApiStatus::Success,
            rejected_labels: Vec::new(),
            rejection_message: "Edit error: We were unable to edit the DNS record.".to_string(),
        }
    }

    /// Make ping() report this status
    pub fn with_ping_status(mut self, status: ApiStatus) -> Self {
        self.ping_status = status;
        self
    }

    /// Refuse edits for the given relative label
    pub fn rejecting(mut self, label: &str) -> Self {
        self.rejected_labels.push(label.to_string());
        self
    }

    /// Message carried by refused edits
    pub fn with_rejection_message(mut self, message: &str) -> Self {
        self.rejection_message = message.to_string();
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ping_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::Ping))
    }

    pub fn list_count(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::List(_)))
    }

    /// Updates in the order they were sent
    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProviderCall::Update { update, .. } => Some(update),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&ProviderCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn ping(&self) -> Result<ApiStatus> {
        self.calls.lock().unwrap().push(ProviderCall::Ping);
        Ok(self.ping_status.clone())
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push(ProviderCall::List(domain.to_string()));
        Ok(self.records.clone())
    }

    async fn update_record(&self, domain: &str, update: &RecordUpdate) -> Result<ApiStatus> {
        self.calls.lock().unwrap().push(ProviderCall::Update {
            domain: domain.to_string(),
            update: update.clone(),
        });

        if self.rejected_labels.contains(&update.name) {
            Ok(ApiStatus::from_fields(
                Some("ERROR".to_string()),
                Some(self.rejection_message.clone()),
            ))
        } else {
            Ok(ApiStatus::Success)
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A StateStore that counts reads and commits
#[derive(Clone, Default)]
pub struct MockStateStore {
    ip: Arc<Mutex<Option<PublicIp>>>,
    reads: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
}

impl MockStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(ip: &str) -> Self {
        let store = Self::default();
        *store.ip.lock().unwrap() = Some(PublicIp::new(ip));
        store
    }

    pub fn stored(&self) -> Option<PublicIp> {
        self.ip.lock().unwrap().clone()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for MockStateStore {
    async fn last_ip(&self) -> Result<Option<PublicIp>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.stored())
    }

    async fn commit_ip(&self, ip: &PublicIp) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        *self.ip.lock().unwrap() = Some(ip.clone());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// A LogSink that keeps every emitted line
#[derive(Clone, Default)]
pub struct CaptureSink {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CaptureSink {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// All emitted text joined by newlines
    pub fn text(&self) -> String {
        self.lines()
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, line)| line.contains(needle))
    }
}

impl LogSink for CaptureSink {
    fn emit(&self, level: Level, line: &str) {
        self.lines.lock().unwrap().push((level, line.to_string()));
    }
}

/// Registrar record as the list call reports it
pub fn record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord::new(id, name, "A", content)
}

/// Minimal configuration managing the given labels as A records
pub fn config_for(labels: &[&str]) -> DdnsConfig {
    let registrar = RegistrarConfig::new(API_KEY, SECRET_KEY);
    labels
        .iter()
        .fold(DdnsConfig::new(DOMAIN, registrar), |config, label| {
            config.with_record(RecordSpec::new(*label, "A"))
        })
        .with_state_store(StateStoreConfig::Memory)
}

/// Logger that captures lines and redacts the test credentials
pub fn capturing_logger(config: &DdnsConfig) -> (RedactingLogger, CaptureSink) {
    let sink = CaptureSink::default();
    let logger = RedactingLogger::new(
        Arc::new(sink.clone()),
        SecretSet::from_registrar(&config.registrar),
    );
    (logger, sink)
}

/// Build a reconciler whose collaborators remain observable through the clones
pub fn reconciler(
    ip_source: impl IpSource + 'static,
    provider: &MockDnsProvider,
    state: &MockStateStore,
    config: &DdnsConfig,
) -> (Reconciler, CaptureSink) {
    let (logger, sink) = capturing_logger(config);
    let reconciler = Reconciler::new(
        Box::new(ip_source),
        Box::new(provider.clone()),
        Box::new(state.clone()),
        logger,
        config,
    )
    .expect("reconciler construction succeeds");
    (reconciler, sink)
}
