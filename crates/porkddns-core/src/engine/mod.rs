//! Reconciliation pass
//!
//! The [`Reconciler`] is responsible for:
//! - Resolving the current public IP via IpSource
//! - Comparing it with the StateStore (idempotency)
//! - Matching configured records against the registrar snapshot
//! - Updating each record via DnsProvider
//! - Persisting the IP only after every update succeeded
//!
//! ## State Machine
//!
//! ```text
//! Start ─► CheckIpChanged ──unchanged──► Done
//!               │
//!            changed
//!               ▼
//!         Authenticate ─► ListRecords ─► UpdateEachRecord ─► Finalize ─► Done
//! ```
//!
//! ## Failure Policy
//!
//! | Condition                         | Effect                                  |
//! |-----------------------------------|-----------------------------------------|
//! | IP lookup exhausted its retries   | fatal, nothing else attempted           |
//! | ping reports non-success          | fatal, no record touched                |
//! | configured record not in snapshot | fatal, remaining records not attempted  |
//! | registrar rejects one update      | folded into the aggregate, loop goes on |
//! | any record rejected               | state untouched, `Error::RecordsFailed` |

use crate::config::{DdnsConfig, RecordSpec};
use crate::error::{Error, Result};
use crate::logging::RedactingLogger;
use crate::traits::{ApiStatus, DnsProvider, DnsRecord, IpSource, PublicIp, RecordUpdate, StateStore};

/// Per-record result of a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// The registrar accepted the update
    Applied,
    /// The record already pointed at the address; no update was sent
    AlreadyCurrent,
    /// The registrar refused the update (or answered without a status)
    Rejected(ApiStatus),
    /// Dry run: the update would have been sent
    Planned,
}

/// Outcome of one matched record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The configured record
    pub spec: RecordSpec,
    /// Fully-qualified name that was matched
    pub fqdn: String,
    /// Registrar ID of the matched record
    pub record_id: String,
    /// What happened to it
    pub status: RecordStatus,
}

impl UpdateOutcome {
    /// Whether this record counts towards a successful pass
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, RecordStatus::Rejected(_))
    }

    /// Whether an update was actually applied at the registrar
    pub fn applied(&self) -> bool {
        matches!(self.status, RecordStatus::Applied)
    }
}

/// Result of a pass that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The IP matched the stored one; nothing was done
    Unchanged {
        ip: PublicIp,
    },
    /// Every record succeeded and the IP was stored
    Applied {
        ip: PublicIp,
        outcomes: Vec<UpdateOutcome>,
    },
    /// Dry run: records were matched but not edited, state not stored
    DryRun {
        ip: PublicIp,
        planned: Vec<UpdateOutcome>,
    },
}

impl PassOutcome {
    /// The address resolved during the pass
    pub fn ip(&self) -> &PublicIp {
        match self {
            PassOutcome::Unchanged { ip }
            | PassOutcome::Applied { ip, .. }
            | PassOutcome::DryRun { ip, .. } => ip,
        }
    }
}

/// Single-pass dynamic DNS reconciler
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run_pass()`] once per invocation
/// 3. Map the result to an exit status
///
/// ## Threading
///
/// All work happens sequentially on the calling task. Records are updated one
/// after another in configured order.
pub struct Reconciler {
    /// IP source for the current address
    ip_source: Box<dyn IpSource>,

    /// Registrar client
    provider: Box<dyn DnsProvider>,

    /// Last applied IP
    state_store: Box<dyn StateStore>,

    /// Status output (secret-redacted)
    logger: RedactingLogger,

    /// Domain whose records are managed
    domain: String,

    /// DNS records to manage, in order
    records: Vec<RecordSpec>,

    /// Skip edits and state writes
    dry_run: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `state_store`: State store implementation
    /// - `logger`: Redacting logger for status lines
    /// - `config`: porkddns configuration (validated here)
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        logger: RedactingLogger,
        config: &DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            state_store,
            logger,
            domain: config.domain.clone(),
            records: config.records.clone(),
            dry_run: config.dry_run,
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(PassOutcome)`: No change, full success, or dry run
    /// - `Err(Error)`: A fatal condition or at least one rejected update.
    ///   State is never written on this path.
    pub async fn run_pass(&self) -> Result<PassOutcome> {
        let ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => return Err(self.fail(e)),
        };
        self.logger.info(format!("Current IP: {}", ip));

        if !self.ip_changed(&ip).await? {
            self.logger.info("IP has not changed. No need to update DNS records.");
            return Ok(PassOutcome::Unchanged { ip });
        }

        self.authenticate().await?;

        let snapshot = match self.provider.list_records(&self.domain).await {
            Ok(records) => records,
            Err(e) => return Err(self.fail(e)),
        };
        self.logger.debug(format!(
            "Fetched {} record(s) for {} from {}",
            snapshot.len(),
            self.domain,
            self.provider.provider_name()
        ));

        let mut outcomes = Vec::with_capacity(self.records.len());
        for spec in &self.records {
            let outcome = self.reconcile_record(spec, &snapshot, &ip).await?;
            outcomes.push(outcome);
        }

        self.finalize(ip, outcomes).await
    }

    /// CheckIpChanged: absent state counts as changed
    async fn ip_changed(&self, ip: &PublicIp) -> Result<bool> {
        let last_ip = match self.state_store.last_ip().await {
            Ok(last_ip) => last_ip,
            Err(e) => return Err(self.fail(e)),
        };

        match last_ip {
            Some(last) if last == *ip => Ok(false),
            Some(last) => {
                self.logger.info(format!("IP changed from {} to {}", last, ip));
                Ok(true)
            }
            None => {
                self.logger.info(format!(
                    "No previously applied IP in {} store",
                    self.state_store.store_name()
                ));
                Ok(true)
            }
        }
    }

    /// Authenticate: any non-success status aborts the pass
    async fn authenticate(&self) -> Result<()> {
        let status = match self.provider.ping().await {
            Ok(status) => status,
            Err(e) => return Err(self.fail(e)),
        };
        self.logger.info(format!("Ping response: {}", status));

        if !status.is_success() {
            return Err(self.fail(Error::auth(format!(
                "{} rejected the credentials ({})",
                self.provider.provider_name(),
                status
            ))));
        }
        Ok(())
    }

    /// UpdateEachRecord, for a single configured record
    async fn reconcile_record(
        &self,
        spec: &RecordSpec,
        snapshot: &[DnsRecord],
        ip: &PublicIp,
    ) -> Result<UpdateOutcome> {
        let fqdn = spec.fqdn(&self.domain);

        let Some(record) = find_record(snapshot, &fqdn, &spec.record_type) else {
            return Err(self.fail(Error::record_not_found(
                &fqdn,
                &spec.record_type,
                &self.domain,
            )));
        };

        let outcome = |status| UpdateOutcome {
            spec: spec.clone(),
            fqdn: fqdn.clone(),
            record_id: record.id.clone(),
            status,
        };

        if record.content == ip.as_str() {
            self.logger.info(format!(
                "Record {} ({}) already points to {}",
                fqdn, spec.record_type, ip
            ));
            return Ok(outcome(RecordStatus::AlreadyCurrent));
        }

        if self.dry_run {
            self.logger.info(format!(
                "[DRY-RUN] Would update record {} (id {}) from {} to {}",
                fqdn, record.id, record.content, ip
            ));
            return Ok(outcome(RecordStatus::Planned));
        }

        self.logger.info(format!(
            "Updating record {} for {} to {}",
            spec.name, self.domain, ip
        ));

        let update = RecordUpdate::new(
            &record.id,
            spec.update_label(),
            &spec.record_type,
            ip.as_str(),
        );
        let status = match self.provider.update_record(&self.domain, &update).await {
            Ok(status) => status,
            Err(e) => return Err(self.fail(e)),
        };

        self.logger.info(format!("Update response for {}: {}", spec.name, status));

        if status.is_success() {
            Ok(outcome(RecordStatus::Applied))
        } else {
            self.logger.warn(format!("Failed to update {}: {}", fqdn, status));
            Ok(outcome(RecordStatus::Rejected(status)))
        }
    }

    /// Finalize: store the IP only when every record succeeded
    async fn finalize(&self, ip: PublicIp, outcomes: Vec<UpdateOutcome>) -> Result<PassOutcome> {
        let failed: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.spec.name.clone())
            .collect();
        let total = outcomes.len();

        if !failed.is_empty() {
            if failed.len() == total {
                self.logger.error(format!(
                    "All {} record update(s) failed; keeping previous state",
                    total
                ));
            } else {
                self.logger.error(format!(
                    "{} of {} record update(s) failed ({}); keeping previous state",
                    failed.len(),
                    total,
                    failed.join(", ")
                ));
            }
            return Err(Error::RecordsFailed { failed, total });
        }

        if self.dry_run {
            self.logger.info("[DRY-RUN] Not storing the new IP");
            return Ok(PassOutcome::DryRun {
                ip,
                planned: outcomes,
            });
        }

        if let Err(e) = self.state_store.commit_ip(&ip).await {
            return Err(self.fail(e));
        }
        let applied = outcomes.iter().filter(|o| o.applied()).count();
        self.logger.info(format!(
            "Updated {} of {} record(s); stored {} as last applied IP",
            applied, total, ip
        ));

        Ok(PassOutcome::Applied { ip, outcomes })
    }

    /// Log a fatal error through the redacting logger and hand it back
    fn fail(&self, error: Error) -> Error {
        self.logger.error(format!("Reconciliation aborted: {}", error));
        error
    }
}

/// First record in `snapshot` with exactly this name and type
fn find_record<'a>(snapshot: &'a [DnsRecord], fqdn: &str, record_type: &str) -> Option<&'a DnsRecord> {
    snapshot
        .iter()
        .find(|r| r.name == fqdn && r.record_type == record_type)
}
