// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use crate::config::StateStoreConfig;
use crate::traits::StateStore;

/// Build the state store described by `config`
pub fn from_config(config: &StateStoreConfig) -> Box<dyn StateStore> {
    match config {
        StateStoreConfig::File { path } => Box::new(FileStateStore::new(path)),
        StateStoreConfig::Memory => Box::new(MemoryStateStore::new()),
    }
}
