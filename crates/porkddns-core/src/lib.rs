// # porkddns-core
//
// Core library for the Porkbun dynamic DNS updater.
//
// ## Architecture Overview
//
// One invocation runs one reconciliation pass:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for the registrar RPC (ping, list, edit)
// - **StateStore**: Trait for the persisted last-applied IP (idempotency)
// - **Reconciler**: Orchestrates IP check → authenticate → list → update → commit
// - **RedactingLogger**: Status output with credentials replaced by placeholders
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Single Pass**: No loops, no daemons; scheduling belongs to cron or timers
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Idempotency**: The state file is only written after every record succeeded

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod state;

// Re-export core types for convenience
pub use traits::{DnsProvider, IpSource, PublicIp, StateStore};
pub use engine::{PassOutcome, Reconciler, RecordStatus, UpdateOutcome};
pub use config::{DdnsConfig, IpSourceConfig, RecordSpec, RegistrarConfig, StateStoreConfig};
pub use error::{Error, Result};
pub use logging::{RedactingLogger, SecretSet};
pub use retry::RetryPolicy;
pub use state::{FileStateStore, MemoryStateStore};
