//! Core traits for porkddns
//!
//! This module defines the seams between the reconciler and its collaborators.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`DnsProvider`]: Registrar RPC (ping, list, edit)
//! - [`StateStore`]: Persisted last-applied IP

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::{IpSource, PublicIp};
pub use dns_provider::{ApiStatus, DnsProvider, DnsRecord, RecordUpdate};
pub use state_store::StateStore;
