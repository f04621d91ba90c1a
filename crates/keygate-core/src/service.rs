//! Async facade over the identity store, credential verifier and token issuer.
//!
//! Transport layers (HTTP handlers, the CLI) call these four operations and
//! map failures with [`AuthError::status_code`]. Argon2 work runs on the
//! blocking pool so it never stalls the async dispatcher.

use std::sync::Arc;

use chrono::Utc;
use tokio::task;
use tracing::{info, warn};

use crate::auth::{bearer_token, Claims, CredentialVerifier, IdentityStore, SecretHasher, TokenIssuer};
use crate::config::CoreConfig;
use crate::error::{AuthError, Result};
use crate::models::wire::{LOGIN_MESSAGE, REGISTERED_MESSAGE, TOKEN_TYPE};
use crate::models::{Credentials, LoginResponse, ProfileResponse, RegisterResponse};
use crate::store::AccountStore;

/// Cheap to clone; all clones share one set of components.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<Components>,
}

struct Components {
    identities: IdentityStore,
    verifier: CredentialVerifier,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>, config: CoreConfig) -> Result<Self> {
        let hasher = SecretHasher::new(config.hasher)?;
        let identities = IdentityStore::new(store, hasher.clone(), config.policy);
        let verifier = CredentialVerifier::new(identities.clone(), hasher);
        let issuer = TokenIssuer::new(config.token);

        Ok(Self {
            inner: Arc::new(Components {
                identities,
                verifier,
                issuer,
            }),
        })
    }

    pub fn identities(&self) -> &IdentityStore {
        &self.inner.identities
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.inner.verifier
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.inner.issuer
    }

    /// Register a new account (201 on success)
    pub async fn register(&self, credentials: Credentials) -> Result<RegisterResponse> {
        let identities = self.inner.identities.clone();
        let account = run_blocking(move || {
            identities.register(&credentials.identifier, &credentials.raw_secret)
        })
        .await?;

        info!(identifier = %account.identifier, "Registration complete");
        Ok(RegisterResponse {
            message: REGISTERED_MESSAGE.to_string(),
        })
    }

    /// Verify credentials and issue an access token with the configured lifetime
    pub async fn login(&self, credentials: Credentials) -> Result<LoginResponse> {
        let verifier = self.inner.verifier.clone();
        let subject = run_blocking(move || {
            verifier.login(&credentials.identifier, &credentials.raw_secret)
        })
        .await?;

        let token = self.inner.issuer.issue_default(&subject)?;
        Ok(LoginResponse {
            message: LOGIN_MESSAGE.to_string(),
            expires_at: token.expires_at(),
            access_token: token.into_string(),
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Validate the bearer token in an `Authorization` header value and return its subject.
    ///
    /// Every protected resource must go through this (or [`Self::profile`]).
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<String> {
        Ok(self.bearer_claims(authorization)?.sub)
    }

    /// Token-protected profile lookup
    pub fn profile(&self, authorization: Option<&str>) -> Result<ProfileResponse> {
        let claims = self.bearer_claims(authorization)?;
        Ok(ProfileResponse {
            expires_at: claims.expires_at(),
            subject: claims.sub,
        })
    }

    fn bearer_claims(&self, authorization: Option<&str>) -> Result<Claims> {
        authorization
            .and_then(bearer_token)
            .ok_or(AuthError::MalformedToken("missing bearer token"))
            .and_then(|token| self.inner.issuer.validate_at(token, Utc::now()))
            .inspect_err(|e| warn!(kind = ?e.kind(), "Rejected bearer token"))
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Hashing(format!("credential worker failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HasherConfig;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use crate::SigningKey;

    fn service() -> AuthService {
        let mut config = CoreConfig::new(SigningKey::generate());
        config.hasher = HasherConfig::insecure_fast();
        AuthService::new(Arc::new(MemoryStore::new()), config).unwrap()
    }

    #[tokio::test]
    async fn test_register_login_profile_flow() {
        let service = service();

        let registered = service
            .register(Credentials::new("a@x.com", "pw123"))
            .await
            .unwrap();
        assert_eq!(registered.message, "User registered successfully");

        let login = service
            .login(Credentials::new("a@x.com", "pw123"))
            .await
            .unwrap();
        assert_eq!(login.message, "Login successful");
        assert_eq!(login.token_type, "Bearer");

        let header = format!("Bearer {}", login.access_token);
        assert_eq!(service.authenticate(Some(&header)).unwrap(), "a@x.com");

        let profile = service.profile(Some(&header)).unwrap();
        assert_eq!(profile.subject, "a@x.com");
        assert_eq!(profile.expires_at, login.expires_at);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let service = service();
        service
            .register(Credentials::new("a@x.com", "pw123"))
            .await
            .unwrap();

        let err = service
            .register(Credentials::new("a@x.com", "other"))
            .await
            .unwrap_err();
        assert_eq!((err.kind(), err.status_code()), (ErrorKind::Conflict, 400));

        let err = service
            .register(Credentials::new("", "pw123"))
            .await
            .unwrap_err();
        assert_eq!((err.kind(), err.status_code()), (ErrorKind::Validation, 400));

        let err = service
            .login(Credentials::new("a@x.com", ""))
            .await
            .unwrap_err();
        assert_eq!((err.kind(), err.status_code()), (ErrorKind::Validation, 400));

        let err = service
            .login(Credentials::new("a@x.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!((err.kind(), err.status_code()), (ErrorKind::Authentication, 401));
    }

    #[tokio::test]
    async fn test_protected_resources_require_a_token() {
        let service = service();

        for header in [None, Some(""), Some("Basic abc"), Some("Bearer not-a-token")] {
            let err = service.profile(header).unwrap_err();
            assert!(err.is_token_error());
            assert_eq!(err.status_code(), 401);
        }
    }

    #[tokio::test]
    async fn test_token_from_another_service_is_rejected() {
        let first = service();
        let second = service();
        first
            .register(Credentials::new("a@x.com", "pw123"))
            .await
            .unwrap();
        let login = first
            .login(Credentials::new("a@x.com", "pw123"))
            .await
            .unwrap();

        let header = format!("Bearer {}", login.access_token);
        assert!(matches!(
            second.authenticate(Some(&header)),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected_by_every_protected_operation() {
        let service = service();
        let issued = chrono::Utc::now() - chrono::Duration::hours(2);
        let token = service
            .issuer()
            .issue_at("a@x.com", std::time::Duration::from_secs(60), issued)
            .unwrap();
        let header = format!("Bearer {}", token);

        assert!(matches!(
            service.authenticate(Some(&header)),
            Err(AuthError::ExpiredToken)
        ));
        assert!(matches!(
            service.profile(Some(&header)),
            Err(AuthError::ExpiredToken)
        ));
    }
}
