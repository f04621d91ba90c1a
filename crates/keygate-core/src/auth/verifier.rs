use tracing::{debug, info};

use crate::error::{AuthError, Result};

use super::identity::MISSING_FIELDS;
use super::{IdentityStore, SecretHasher};

/// Checks submitted credentials against stored hashes.
#[derive(Clone)]
pub struct CredentialVerifier {
    identities: IdentityStore,
    hasher: SecretHasher,
}

impl CredentialVerifier {
    pub fn new(identities: IdentityStore, hasher: SecretHasher) -> Self {
        Self { identities, hasher }
    }

    pub fn hash(&self, raw_secret: &str) -> Result<String> {
        self.hasher.hash(raw_secret)
    }

    pub fn verify(&self, raw_secret: &str, secret_hash: &str) -> Result<bool> {
        self.hasher.verify(raw_secret, secret_hash)
    }

    /// Verify credentials and return the identifier to use as a token subject.
    ///
    /// An unknown identifier and a wrong secret produce the same
    /// `Authentication` error, and both cost one hash verification.
    pub fn login(&self, identifier: &str, raw_secret: &str) -> Result<String> {
        if identifier.is_empty() || raw_secret.is_empty() {
            return Err(AuthError::validation(MISSING_FIELDS));
        }

        let Some(account) = self.identities.find_by_identifier(identifier)? else {
            self.hasher.verify_dummy(raw_secret);
            debug!("Login rejected");
            return Err(AuthError::Authentication);
        };

        if !self.hasher.verify(raw_secret, &account.secret_hash)? {
            debug!("Login rejected");
            return Err(AuthError::Authentication);
        }

        info!(identifier = %account.identifier, "Login verified");
        Ok(account.identifier)
    }
}
