// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Keeps the last applied IP for the lifetime of the process only. Every new
// process starts with no state, so its first pass always updates the
// registrar. Useful for tests, embedding, and one-off runs.

use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::traits::ip_source::PublicIp;
use crate::traits::state_store::StateStore;
use crate::Error;

/// In-memory state store implementation
///
/// Clones share the same slot.
///
/// # Example
///
/// ```rust
/// use porkddns_core::state::MemoryStateStore;
/// use porkddns_core::traits::{PublicIp, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     assert_eq!(store.last_ip().await?, None);
///
///     store.commit_ip(&PublicIp::new("203.0.113.7")).await?;
///     assert_eq!(store.last_ip().await?, Some(PublicIp::new("203.0.113.7")));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<PublicIp>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `ip`
    pub fn with_ip(ip: PublicIp) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(ip))),
        }
    }

    /// Clear the stored value
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn last_ip(&self) -> Result<Option<PublicIp>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn commit_ip(&self, ip: &PublicIp) -> Result<(), Error> {
        *self.inner.write().await = Some(ip.clone());
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStateStore::new();
        assert_eq!(store.last_ip().await.unwrap(), None);

        let ip = PublicIp::new("203.0.113.7");
        store.commit_ip(&ip).await.unwrap();
        assert_eq!(store.last_ip().await.unwrap(), Some(ip));

        store.clear().await;
        assert_eq!(store.last_ip().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStateStore::with_ip(PublicIp::new("10.0.0.1"));
        let handle = store.clone();

        store.commit_ip(&PublicIp::new("10.0.0.2")).await.unwrap();
        assert_eq!(handle.last_ip().await.unwrap(), Some(PublicIp::new("10.0.0.2")));
    }
}
