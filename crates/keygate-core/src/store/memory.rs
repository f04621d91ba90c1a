use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::models::Account;

use super::AccountStore;

/// In-process account store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for MemoryStore {
    fn insert(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| StoreError::Poisoned)?;
        match accounts.entry(account.identifier.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    fn get(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(accounts.get(identifier).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let accounts = self.accounts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(accounts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let store = MemoryStore::new();
        assert!(store.is_empty().unwrap());

        store.insert(Account::new("a@x.com", "hash-1")).unwrap();
        let found = store.get("a@x.com").unwrap().unwrap();
        assert_eq!(found.secret_hash, "hash-1");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_insert_keeps_original() {
        let store = MemoryStore::new();
        store.insert(Account::new("a@x.com", "hash-1")).unwrap();

        let result = store.insert(Account::new("a@x.com", "hash-2"));
        assert!(matches!(result, Err(StoreError::AlreadyExists)));
        assert_eq!(store.get("a@x.com").unwrap().unwrap().secret_hash, "hash-1");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        store.insert(Account::new("a@x.com", "hash-1")).unwrap();
        assert!(store.get("A@x.com").unwrap().is_none());

        // A differently-cased identifier is a different account
        store.insert(Account::new("A@x.com", "hash-2")).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }
}
