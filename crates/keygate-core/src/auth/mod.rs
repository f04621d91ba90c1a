//! Credential and token lifecycle.
//!
//! This module provides:
//! - `IdentityStore`: registration with identifier uniqueness, and lookup
//! - `SecretHasher` / `CredentialVerifier`: Argon2id hashing and login checks
//! - `TokenIssuer`: HMAC-signed, expiring bearer tokens
//! - `SigningKey`: the process-wide token signing secret

pub mod identity;
pub mod password;
pub mod signing_key;
pub mod token;
pub mod verifier;

pub use identity::IdentityStore;
pub use password::SecretHasher;
pub use signing_key::{KeyError, SigningKey};
pub use token::{bearer_token, Claims, Token, TokenIssuer};
pub use verifier::CredentialVerifier;
