use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shared by every failed login, whether the identity is unknown or the secret is wrong.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    Conflict,

    #[error("Invalid credentials")]
    Authentication,

    #[error("Malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(String),
}

/// Stable, machine-readable error kind for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authentication,
    MalformedToken,
    InvalidSignature,
    ExpiredToken,
    Internal,
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Conflict => ErrorKind::Conflict,
            AuthError::Authentication => ErrorKind::Authentication,
            AuthError::MalformedToken(_) => ErrorKind::MalformedToken,
            AuthError::InvalidSignature => ErrorKind::InvalidSignature,
            AuthError::ExpiredToken => ErrorKind::ExpiredToken,
            AuthError::Storage(_) | AuthError::Hashing(_) | AuthError::Signing(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP-equivalent status for the boundary collaborator
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            // Duplicate registration is reported as a bad request, not 409
            ErrorKind::Validation | ErrorKind::Conflict => 400,
            ErrorKind::Authentication
            | ErrorKind::MalformedToken
            | ErrorKind::InvalidSignature
            | ErrorKind::ExpiredToken => 401,
            ErrorKind::Internal => 500,
        }
    }

    pub fn is_token_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedToken | ErrorKind::InvalidSignature | ErrorKind::ExpiredToken
        )
    }
}

/// Failures raised by an [`AccountStore`](crate::store::AccountStore) engine.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("account already exists")]
    AlreadyExists,

    #[error("store lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store document: {0}")]
    Serialization(#[from] serde_json::Error),
}
