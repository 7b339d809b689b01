//! Runtime for executing lifecycle operations against storage and messaging

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{LifecycleOutcome, LifecycleRuntime, RuntimeError, DEFAULT_GREETING};
pub use traits::*;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = LifecycleRuntime<DatabaseStorage, DatabaseStorage>;

impl ProductionRuntime {
    /// Runtime backed by one database for both requests and conversations
    pub fn from_database(db: crate::db::Database) -> Self {
        let storage = DatabaseStorage::new(db);
        LifecycleRuntime::new(storage.clone(), storage)
    }
}
