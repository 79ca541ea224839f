//! # Cryptographic Utilities
//!
//! Password credentials and secure token generation.
//!
//! ## Invariants
//! - Passwords are only stored as scrypt digests, each with its own random salt
//! - Digests and token hashes are compared in constant time
//!
//! ## Stored credential format
//!
//! `<hex digest>.<hex salt>`. The salt is fed to scrypt as the bytes of its
//! hex text, not the decoded bytes, so credentials written by earlier
//! deployments keep verifying.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::errors::{AuthError, AuthResult};

/// Random salt bytes per credential (32 hex chars once encoded)
pub const SALT_LEN: usize = 16;

/// Digest bytes for newly issued credentials (64 hex chars once encoded)
pub const DIGEST_LEN: usize = 32;

/// Accepted digest lengths when parsing stored credentials.
/// Older deployments stored 64-byte digests.
const MIN_STORED_DIGEST_LEN: usize = 16;
const MAX_STORED_DIGEST_LEN: usize = 64;

/// scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost N
    #[serde(default = "default_log_n")]
    pub log_n: u8,
    /// Block size
    #[serde(default = "default_r")]
    pub r: u32,
    /// Parallelism
    #[serde(default = "default_p")]
    pub p: u32,
}

fn default_log_n() -> u8 {
    14
}

fn default_r() -> u32 {
    8
}

fn default_p() -> u32 {
    1
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: default_log_n(),
            r: default_r(),
            p: default_p(),
        }
    }
}

impl KdfParams {
    /// Reject parameter sets scrypt cannot run with
    pub fn validate(&self) -> AuthResult<()> {
        self.scrypt_params().map(|_| ())
    }

    fn scrypt_params(&self) -> AuthResult<scrypt::Params> {
        scrypt::Params::new(self.log_n, self.r, self.p, DIGEST_LEN)
            .map_err(|_| AuthError::HashingFailed)
    }
}

/// A derived-key digest and the salt that produced it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoredCredential {
    digest: Vec<u8>,
    /// Hex text of the salt, used verbatim as scrypt input
    salt: String,
}

impl StoredCredential {
    /// Parse `<hex digest>.<hex salt>`
    pub fn parse(encoded: &str) -> AuthResult<Self> {
        let (digest_hex, salt) = encoded
            .split_once('.')
            .ok_or(AuthError::MalformedCredential)?;

        if salt.is_empty() || hex::decode(salt).is_err() {
            return Err(AuthError::MalformedCredential);
        }

        let digest = hex::decode(digest_hex).map_err(|_| AuthError::MalformedCredential)?;
        if !(MIN_STORED_DIGEST_LEN..=MAX_STORED_DIGEST_LEN).contains(&digest.len()) {
            return Err(AuthError::MalformedCredential);
        }

        Ok(Self {
            digest,
            salt: salt.to_string(),
        })
    }

    /// Encode as `<hex digest>.<hex salt>`
    pub fn encode(&self) -> String {
        format!("{}.{}", hex::encode(&self.digest), self.salt)
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn digest_len(&self) -> usize {
        self.digest.len()
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("digest", &"<redacted>")
            .field("salt", &self.salt)
            .finish()
    }
}

impl fmt::Display for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StoredCredential {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoredCredential {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoredCredential> for String {
    fn from(credential: StoredCredential) -> Self {
        credential.encode()
    }
}

/// Issues and verifies password credentials.
///
/// Derivation is deliberately slow; async callers should run these methods
/// on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialVerifier {
    params: KdfParams,
}

impl CredentialVerifier {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive `len` bytes from a password and salt
    ///
    /// Deterministic for the same inputs. Fails only on bad parameters or
    /// output length, which is an internal error and never a mismatch.
    pub fn derive(&self, password: &str, salt: &str, len: usize) -> AuthResult<Vec<u8>> {
        let params = self.params.scrypt_params()?;
        let mut output = vec![0u8; len];
        scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut output)
            .map_err(|_| AuthError::HashingFailed)?;
        Ok(output)
    }

    /// Create a credential for a password with a fresh random salt
    pub fn issue(&self, password: &str) -> AuthResult<StoredCredential> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = hex::encode(salt_bytes);

        let digest = self.derive(password, &salt, DIGEST_LEN)?;
        Ok(StoredCredential { digest, salt })
    }

    /// Check a password against a stored credential
    ///
    /// `Ok(false)` on mismatch. The digest is recomputed at the stored
    /// length and compared in constant time.
    pub fn verify(&self, password: &str, credential: &StoredCredential) -> AuthResult<bool> {
        let supplied = self.derive(password, &credential.salt, credential.digest.len())?;
        Ok(constant_time_eq(&supplied, &credential.digest))
    }
}

/// Password requirements configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 1 }
    }
}

impl PasswordPolicy {
    /// Validate a password against this policy
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.min_length.max(1) {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.min_length.max(1)
            )));
        }
        Ok(())
    }
}

/// Generate a cryptographically secure random token
///
/// Returns a 256-bit (32-byte) random value as base64.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a token for storage using SHA-256
///
/// Tokens are stored hashed; the raw token only lives in the client cookie.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, result)
}

/// Constant-time comparison of two byte slices
///
/// Slices of different length compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
