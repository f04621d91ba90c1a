//! Account registration and lookup.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::IdentityPolicy;
use crate::error::{AuthError, Result, StoreError};
use crate::models::Account;
use crate::store::AccountStore;

use super::SecretHasher;

pub const MISSING_FIELDS: &str = "Email and password are required";

/// Registers identities and looks them up, enforcing identifier uniqueness.
#[derive(Clone)]
pub struct IdentityStore {
    store: Arc<dyn AccountStore>,
    hasher: SecretHasher,
    policy: IdentityPolicy,
}

impl IdentityStore {
    pub fn new(store: Arc<dyn AccountStore>, hasher: SecretHasher, policy: IdentityPolicy) -> Self {
        Self {
            store,
            hasher,
            policy,
        }
    }

    /// Create a new account.
    ///
    /// Fails with `Validation` for empty or policy-violating input and with
    /// `Conflict` when the identifier is already registered. The uniqueness
    /// check that matters is the store's atomic insert; the early lookup only
    /// avoids hashing for an obvious duplicate.
    pub fn register(&self, identifier: &str, raw_secret: &str) -> Result<Account> {
        self.validate(identifier, raw_secret)?;

        if self.store.get(identifier)?.is_some() {
            debug!(identifier = %identifier, "Registration rejected: identifier taken");
            return Err(AuthError::Conflict);
        }

        let secret_hash = self.hasher.hash(raw_secret)?;
        let account = Account::new(identifier, secret_hash);

        match self.store.insert(account.clone()) {
            Ok(()) => {
                info!(identifier = %identifier, "Account registered");
                Ok(account)
            }
            Err(StoreError::AlreadyExists) => {
                debug!(identifier = %identifier, "Registration lost race for identifier");
                Err(AuthError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>> {
        Ok(self.store.get(identifier)?)
    }

    fn validate(&self, identifier: &str, raw_secret: &str) -> Result<()> {
        if identifier.is_empty() || raw_secret.is_empty() {
            return Err(AuthError::validation(MISSING_FIELDS));
        }

        if self.policy.require_email_shape && !looks_like_email(identifier) {
            return Err(AuthError::validation("Please enter a valid email address"));
        }

        if raw_secret.chars().count() < self.policy.min_secret_length {
            return Err(AuthError::validation(format!(
                "Password must be at least {} characters long",
                self.policy.min_secret_length
            )));
        }

        Ok(())
    }
}

/// `local@domain.tld` with no whitespace and a dot somewhere after the `@`
fn looks_like_email(identifier: &str) -> bool {
    if identifier.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = identifier.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HasherConfig;
    use crate::store::MemoryStore;

    fn identities(policy: IdentityPolicy) -> IdentityStore {
        let hasher = SecretHasher::new(HasherConfig::insecure_fast()).unwrap();
        IdentityStore::new(Arc::new(MemoryStore::new()), hasher, policy)
    }

    #[test]
    fn test_register_stores_hash_not_secret() {
        let identities = identities(IdentityPolicy::default());
        let account = identities.register("a@x.com", "pw123").unwrap();
        assert_eq!(account.identifier, "a@x.com");
        assert_ne!(account.secret_hash, "pw123");

        let found = identities.find_by_identifier("a@x.com").unwrap().unwrap();
        assert_eq!(found, account);
    }

    #[test]
    fn test_register_requires_both_fields() {
        let identities = identities(IdentityPolicy::default());
        for (identifier, secret) in [("", "pw123"), ("a@x.com", "")] {
            let err = identities.register(identifier, secret).unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)));
            assert_eq!(err.to_string(), MISSING_FIELDS);
        }
        assert!(identities.find_by_identifier("a@x.com").unwrap().is_none());
    }

    #[test]
    fn test_whitespace_identifier_is_not_empty() {
        let identities = identities(IdentityPolicy::default());
        let account = identities.register("   ", "pw123").unwrap();
        assert_eq!(account.identifier, "   ");
        assert!(identities.find_by_identifier("   ").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_register_conflicts_and_keeps_hash() {
        let identities = identities(IdentityPolicy::default());
        let original = identities.register("a@x.com", "pw123").unwrap();

        let err = identities.register("a@x.com", "another").unwrap_err();
        assert!(matches!(err, AuthError::Conflict));

        let found = identities.find_by_identifier("a@x.com").unwrap().unwrap();
        assert_eq!(found.secret_hash, original.secret_hash);
    }

    #[test]
    fn test_strict_policy() {
        let identities = identities(IdentityPolicy {
            require_email_shape: true,
            min_secret_length: 8,
        });

        let err = identities.register("not-an-email", "longenough").unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address");

        let err = identities.register("a@x.com", "short").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters long");

        assert!(identities.register("a@x.com", "longenough").is_ok());
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@x.com"));
        assert!(looks_like_email("first.last@sub.example.org"));
        assert!(!looks_like_email("a@x"));
        assert!(!looks_like_email("@x.com"));
        assert!(!looks_like_email("a b@x.com"));
        assert!(!looks_like_email("a@@x.com"));
        assert!(!looks_like_email("a@.com"));
    }
}
