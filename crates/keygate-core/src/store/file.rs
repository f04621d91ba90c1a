use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::Account;

use super::{write_private, AccountStore};

/// Store file name inside the data directory
pub const ACCOUNTS_FILE: &str = "accounts.json";

/// On-disk document format version
const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    accounts: Vec<Account>,
}

#[derive(Serialize)]
struct StoreDocumentRef<'a> {
    version: u32,
    accounts: Vec<&'a Account>,
}

/// Account store persisted as a single JSON document.
///
/// The whole document is held in memory and rewritten on every insert.
/// Writes go to a temp file that is renamed over the original, so a crash
/// mid-write leaves the previous document intact. One process should own
/// the file at a time; the mutex only serializes callers within a process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    accounts: Mutex<HashMap<String, Account>>,
}

impl FileStore {
    /// Open (or create) `accounts.json` under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        Self::open_file(data_dir.join(ACCOUNTS_FILE))
    }

    pub fn open_file(path: PathBuf) -> Result<Self, StoreError> {
        let accounts = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let document: StoreDocument = serde_json::from_str(&contents)?;
            debug!(
                path = %path.display(),
                version = document.version,
                count = document.accounts.len(),
                "Loaded account store"
            );
            document
                .accounts
                .into_iter()
                .map(|account| (account.identifier.clone(), account))
                .collect()
        } else {
            info!(path = %path.display(), "Creating new account store");
            HashMap::new()
        };

        Ok(Self {
            path,
            accounts: Mutex::new(accounts),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Account>>, StoreError> {
        self.accounts.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, accounts: &HashMap<String, Account>) -> Result<(), StoreError> {
        let mut sorted: Vec<&Account> = accounts.values().collect();
        sorted.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let document = StoreDocumentRef {
            version: DOCUMENT_VERSION,
            accounts: sorted,
        };
        let contents = serde_json::to_string_pretty(&document)?;

        let tmp_path = self.path.with_extension("json.tmp");
        write_private(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl AccountStore for FileStore {
    fn insert(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.lock()?;
        if accounts.contains_key(&account.identifier) {
            return Err(StoreError::AlreadyExists);
        }

        let identifier = account.identifier.clone();
        accounts.insert(identifier.clone(), account);

        if let Err(e) = self.persist(&accounts) {
            // Keep memory and disk in agreement
            accounts.remove(&identifier);
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.get(identifier).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.insert(Account::new("a@x.com", "hash-1")).unwrap();
            store.insert(Account::new("b@x.com", "hash-2")).unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.get("b@x.com").unwrap().unwrap().secret_hash, "hash-2");
    }

    #[test]
    fn test_duplicate_is_rejected_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.insert(Account::new("a@x.com", "hash-1")).unwrap();

        let result = store.insert(Account::new("a@x.com", "hash-2"));
        assert!(matches!(result, Err(StoreError::AlreadyExists)));

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("a@x.com").unwrap().unwrap().secret_hash, "hash-1");
    }

    #[test]
    fn test_document_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.insert(Account::new("a@x.com", "hash-1")).unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let document: StoreDocument = serde_json::from_str(&contents).unwrap();
        assert_eq!(document.version, DOCUMENT_VERSION);
        assert_eq!(document.accounts.len(), 1);
        assert!(!dir.path().join("accounts.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACCOUNTS_FILE), "{not json").unwrap();
        let result = FileStore::open(dir.path());
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.insert(Account::new("a@x.com", "hash-1")).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_readable_temp_file_does_not_leak() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tmp_path = dir.path().join("accounts.json.tmp");
        std::fs::write(&tmp_path, "leftover").unwrap();
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        store.insert(Account::new("a@x.com", "hash-1")).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp_path.exists());
    }
}
