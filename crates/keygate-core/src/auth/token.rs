//! Access token issuance and validation.
//!
//! Tokens use the compact JWS layout: three base64url (no padding) segments
//! `header.claims.signature`. The header names the algorithm (`HS256`), the
//! claims carry subject, issue time and expiry in whole seconds, and the
//! signature is HMAC-SHA256 over `header.claims` keyed with the issuer's
//! [`SigningKey`].

use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::{AuthError, Result};

use super::SigningKey;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Signed token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account identifier the token asserts
    pub sub: String,
    /// Issued at, seconds since the Unix epoch
    pub iat: i64,
    /// Expires at, seconds since the Unix epoch
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }

    /// Valid strictly before `exp`, compared at full clock precision
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// A freshly issued token and the claims it carries.
#[derive(Clone)]
pub struct Token {
    claims: Claims,
    encoded: String,
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn into_string(self) -> String {
        self.encoded
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.claims.issued_at()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

// Bearer tokens are credentials; keep them out of debug output
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

/// Mints and checks signed, expiring bearer tokens.
///
/// Owns the signing key for its whole lifetime; there is no rotation.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            key: config.signing_key,
            default_ttl: config.ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<Token> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue with the configured lifetime
    pub fn issue_default(&self, subject: &str) -> Result<Token> {
        self.issue(subject, self.default_ttl)
    }

    /// Issue a token as if the clock read `now`.
    ///
    /// `exp` is `now + ttl` rounded up to the next whole second, so a token
    /// never expires before its full lifetime has elapsed.
    pub fn issue_at(&self, subject: &str, ttl: Duration, now: DateTime<Utc>) -> Result<Token> {
        if subject.is_empty() {
            return Err(AuthError::validation("Token subject is required"));
        }
        if ttl.is_zero() {
            return Err(AuthError::validation("Token lifetime must be positive"));
        }

        let iat = now.timestamp();
        let exp = ChronoDuration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .and_then(|expiry| {
                expiry
                    .timestamp()
                    .checked_add(i64::from(expiry.timestamp_subsec_nanos() > 0))
            })
            .ok_or_else(|| AuthError::validation("Token lifetime is too long"))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp,
        };

        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        };
        let header_segment = encode_segment(&header)?;
        let claims_segment = encode_segment(&claims)?;
        let signing_input = format!("{}.{}", header_segment, claims_segment);

        let signature = self.mac(&signing_input)?.finalize().into_bytes();
        let encoded = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature));

        debug!(subject = %claims.sub, exp = claims.exp, "Issued access token");
        Ok(Token { claims, encoded })
    }

    /// Validate a token and return its subject
    pub fn validate(&self, token: &str) -> Result<String> {
        Ok(self.validate_at(token, Utc::now())?.sub)
    }

    /// Validate a token against the clock reading `now` and return its claims.
    ///
    /// Checks run in order: structure, signature, expiry.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_segment, claims_segment, signature_segment] = segments.as_slice() else {
            return Err(AuthError::MalformedToken("expected three segments"));
        };

        let header: Header = decode_segment(header_segment, "header")?;
        if header.alg != ALGORITHM {
            return Err(AuthError::MalformedToken("unsupported algorithm"));
        }
        if header.typ.as_deref().is_some_and(|typ| typ != TOKEN_TYPE) {
            return Err(AuthError::MalformedToken("unsupported token type"));
        }

        let claims: Claims = decode_segment(claims_segment, "claims")?;
        if claims.sub.is_empty() {
            return Err(AuthError::MalformedToken("missing subject"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_segment)
            .map_err(|_| AuthError::MalformedToken("signature is not base64url"))?;

        // verify_slice compares in constant time
        let signing_input_len = header_segment.len() + 1 + claims_segment.len();
        self.mac(&token[..signing_input_len])?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        if claims.is_expired_at(now) {
            debug!(subject = %claims.sub, exp = claims.exp, "Rejected expired token");
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

/// Extract the token from an `Authorization` header value (`Bearer <token>`)
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| AuthError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, name: &'static str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| {
        AuthError::MalformedToken(match name {
            "header" => "header is not base64url",
            _ => "claims are not base64url",
        })
    })?;
    serde_json::from_slice(&bytes).map_err(|_| {
        AuthError::MalformedToken(match name {
            "header" => "header is not valid JSON",
            _ => "claims are not valid JSON",
        })
    })
}
