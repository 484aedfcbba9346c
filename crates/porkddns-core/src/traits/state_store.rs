// # State Store Trait
//
// Defines the interface for the single persisted value: the last IP that was
// applied to every configured record.
//
// ## Purpose
//
// The state store makes a pass idempotent. When the resolved IP equals the
// stored one, the pass ends without touching the registrar.
//
// ## Implementations
//
// - File-based: plain-text file (`FileStateStore`)
// - In-memory: `MemoryStateStore` (tests, embedding)
//
// ## Usage
//
// ```rust,ignore
// use porkddns_core::{PublicIp, StateStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* StateStore implementation */;
//
//     let last_ip = store.last_ip().await?;
//
//     // Only after every record update succeeded
//     store.commit_ip(&PublicIp::new("203.0.113.7")).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::traits::ip_source::PublicIp;

/// Trait for state store implementations
///
/// # Commit Rule
///
/// `commit_ip` is called at most once per pass, and only when every record
/// update in that pass succeeded. Implementations must make the write durable
/// before returning.
///
/// No locking is provided across processes; the invoker serialises runs.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the last applied IP
    ///
    /// # Returns
    ///
    /// - `Ok(Some(PublicIp))`: The stored address
    /// - `Ok(None)`: Nothing stored yet (first run)
    /// - `Err(Error)`: Storage error
    async fn last_ip(&self) -> Result<Option<PublicIp>, crate::Error>;

    /// Persist `ip` as the last applied IP
    async fn commit_ip(&self, ip: &PublicIp) -> Result<(), crate::Error>;

    /// Get the store name (for logging)
    fn store_name(&self) -> &'static str;
}
