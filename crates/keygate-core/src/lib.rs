//! keygate-core: account registration, credential verification and bearer
//! token issuance.
//!
//! # Modules
//!
//! - `auth`: identity store, secret hashing, login verification, token issuer
//! - `store`: account storage engines (in-memory, JSON file)
//! - `service`: async facade exposing register / login / validate / profile
//! - `config`: explicit configuration structs for each component
//! - `models`: accounts and request/response bodies
//! - `error`: error taxonomy with transport status mapping

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use auth::{CredentialVerifier, IdentityStore, SecretHasher, SigningKey, Token, TokenIssuer};
pub use config::{CoreConfig, HasherConfig, IdentityPolicy, TokenConfig};
pub use error::{AuthError, ErrorKind, Result, StoreError};
pub use service::AuthService;
