//! Request and response bodies exchanged with the transport layer.
//!
//! Field aliases accept the `email` / `password` names used by existing clients.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, ErrorKind};

pub const REGISTERED_MESSAGE: &str = "User registered successfully";
pub const LOGIN_MESSAGE: &str = "Login successful";
pub const TOKEN_TYPE: &str = "Bearer";

/// Identifier + raw secret, as submitted to register and login
#[derive(Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, alias = "email")]
    pub identifier: String,
    #[serde(default, alias = "password")]
    pub raw_secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, raw_secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_secret: raw_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("raw_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub expires_at: DateTime<Utc>,
}

/// Returned by the token-protected profile operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProfileResponse {
    pub subject: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub error: String,
}

impl From<&AuthError> for ErrorBody {
    fn from(err: &AuthError) -> Self {
        // Internal failures carry engine details that callers should not see
        let error = match err.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => err.to_string(),
        };
        Self {
            kind: err.kind(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_accept_email_password_aliases() {
        let creds: Credentials =
            serde_json::from_str(r#"{"email": "a@x.com", "password": "pw123"}"#).unwrap();
        assert_eq!(creds.identifier, "a@x.com");
        assert_eq!(creds.raw_secret, "pw123");

        let creds: Credentials =
            serde_json::from_str(r#"{"identifier": "a@x.com", "rawSecret": "pw123"}"#).unwrap();
        assert_eq!(creds.identifier, "a@x.com");
        assert_eq!(creds.raw_secret, "pw123");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let creds: Credentials = serde_json::from_str(r#"{"email": "a@x.com"}"#).unwrap();
        assert!(creds.raw_secret.is_empty());
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let debug = format!("{:?}", Credentials::new("a@x.com", "hunter22"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_error_body_hides_internal_details() {
        let err = AuthError::Hashing("argon2 exploded".to_string());
        let body = ErrorBody::from(&err);
        assert_eq!(body.kind, ErrorKind::Internal);
        assert_eq!(body.error, "Internal server error");

        let body = ErrorBody::from(&AuthError::Authentication);
        assert_eq!(body.error, "Invalid credentials");
    }
}
