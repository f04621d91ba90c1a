//! Account storage engines.
//!
//! The core only needs two things from storage: an atomic
//! check-and-insert keyed on `identifier`, and an exact-match lookup.
//! `MemoryStore` keeps accounts in a lock-guarded map; `FileStore` persists
//! them as a JSON document on disk.

pub mod file;
mod fs;
pub mod memory;

pub use file::FileStore;
pub use fs::write_private;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::Account;

pub trait AccountStore: Send + Sync {
    /// Insert a new account. Must fail with [`StoreError::AlreadyExists`]
    /// without modifying anything when the identifier is taken, even under
    /// concurrent callers.
    fn insert(&self, account: Account) -> Result<(), StoreError>;

    /// Case-sensitive exact lookup
    fn get(&self, identifier: &str) -> Result<Option<Account>, StoreError>;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
