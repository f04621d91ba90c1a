use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum key length in bytes. HMAC-SHA256 gains nothing from more than
/// its block size, but anything under the digest size weakens it.
pub const MIN_KEY_LENGTH: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing key must be at least {MIN_KEY_LENGTH} bytes, got {0}")]
    TooShort(usize),

    #[error("signing key material is empty")]
    Empty,
}

/// Process-wide secret used to sign access tokens.
///
/// Bytes are wiped on drop and never shown by `Debug`.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() < MIN_KEY_LENGTH {
            return Err(KeyError::TooShort(bytes.len()));
        }
        Ok(Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        })
    }

    /// Parse key material from configuration.
    ///
    /// Accepted forms, tried in order: hex, base64url (no padding),
    /// standard base64, then the raw UTF-8 bytes of the string.
    pub fn from_material(raw: &str) -> Result<Self, KeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(KeyError::Empty);
        }

        if trimmed.len() >= MIN_KEY_LENGTH * 2 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(bytes) = hex::decode(trimmed) {
                return Self::from_bytes(&Zeroizing::new(bytes));
            }
        }

        for engine in [&general_purpose::URL_SAFE_NO_PAD, &general_purpose::STANDARD] {
            if let Ok(bytes) = engine.decode(trimmed) {
                let bytes = Zeroizing::new(bytes);
                if bytes.len() >= MIN_KEY_LENGTH {
                    return Self::from_bytes(&bytes);
                }
            }
        }

        Self::from_bytes(trimmed.as_bytes())
    }

    /// Fresh random 32-byte key
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; MIN_KEY_LENGTH]);
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Hex form, suitable for storing in a keychain or env file
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes.as_slice()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
