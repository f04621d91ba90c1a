use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One registered identity.
///
/// `identifier` is the case-sensitive primary key. `secret_hash` is the PHC
/// string produced by [`SecretHasher`](crate::auth::SecretHasher) and is
/// never the raw secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub identifier: String,
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(identifier: impl Into<String>, secret_hash: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret_hash: secret_hash.into(),
            created_at: Utc::now(),
        }
    }
}

// Hand-written so the hash never ends up in logs or panic messages
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("identifier", &self.identifier)
            .field("secret_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}
