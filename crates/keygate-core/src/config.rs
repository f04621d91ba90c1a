//! Configuration passed explicitly into each core component.
//!
//! Nothing here reads the environment or touches the filesystem; the host
//! process builds these structs (see `keygate-cli`) and hands them over at
//! construction time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::SigningKey;

/// Default access token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Argon2id work factor.
///
/// Defaults match the argon2 crate's recommended parameters
/// (19 MiB memory, 2 passes, 1 lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl HasherConfig {
    /// Minimum parameters argon2 accepts. Only suitable for tests.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: argon2::Params::MIN_M_COST,
            iterations: argon2::Params::MIN_T_COST,
            parallelism: argon2::Params::MIN_P_COST,
        }
    }
}

/// Extra registration rules on top of the non-empty check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityPolicy {
    /// Require identifiers to look like `local@domain.tld`
    pub require_email_shape: bool,
    /// Minimum secret length in characters
    pub min_secret_length: usize,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            require_email_shape: false,
            min_secret_length: 1,
        }
    }
}

/// Token issuer settings. The signing key is fixed for the issuer's lifetime.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub signing_key: SigningKey,
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Everything [`AuthService`](crate::AuthService) needs to wire the three components.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub hasher: HasherConfig,
    pub policy: IdentityPolicy,
    pub token: TokenConfig,
}

impl CoreConfig {
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            hasher: HasherConfig::default(),
            policy: IdentityPolicy::default(),
            token: TokenConfig::new(signing_key),
        }
    }
}
