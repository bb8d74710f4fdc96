//! # scrypt Key Derivation
//!
//! Every secret in the protocol passes through scrypt: contact private keys
//! are stretched from passwords, envelope keys from DH secrets or
//! passwords, and signature nonces from the signed data.
//!
//! ## Presets
//!
//! | Preset | N | r | p | len | Use |
//! |--------|---|---|---|-----|-----|
//! | [`KdfConfig::default`] | 2^14 | 10 | 3 | 64 | Password-derived identities |
//! | [`KdfConfig::tuned`] | 2^15 | 8 | 1 | 64 | Interactive logins |
//! | [`KdfConfig::ephemeral`] | 2^10 | 4 | 1 | 32 | Random keys, tests |
//!
//! ## Backends
//!
//! scrypt is CPU- and memory-bound. [`KdfBackend::Blocking`] runs it on
//! the tokio blocking pool; [`KdfBackend::Inline`] runs it on the calling
//! task. Both produce identical output, and `Blocking` degrades to
//! `Inline` when no runtime is available.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

/// Placeholder length handed to `scrypt::Params`; the real output length
/// is the size of the buffer passed to `scrypt::scrypt`.
const PARAMS_LEN: usize = 32;

/// scrypt cost parameters.
///
/// Serialized with the field names `N`, `r`, `p`, `len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KdfConfig {
    /// CPU/memory cost, a power of two greater than 1
    #[serde(rename = "N")]
    pub n: u64,
    /// Block size
    pub r: u32,
    /// Parallelism
    pub p: u32,
    /// Output length in bytes
    pub len: usize,
}

impl Default for KdfConfig {
    /// The "worst case" preset used when a password is supplied.
    fn default() -> Self {
        Self::new(1 << 14, 10, 3, 64)
    }
}

impl KdfConfig {
    /// Create a configuration without validating it.
    #[must_use]
    pub const fn new(n: u64, r: u32, p: u32, len: usize) -> Self {
        Self { n, r, p, len }
    }

    /// Cheaper preset for interactive password use.
    #[must_use]
    pub const fn tuned() -> Self {
        Self::new(1 << 15, 8, 1, 64)
    }

    /// Minimal preset for keys that are already uniformly random.
    ///
    /// **Warning:** offers no brute-force resistance for passwords.
    #[must_use]
    pub const fn ephemeral() -> Self {
        Self::new(1 << 10, 4, 1, 32)
    }

    /// Same cost parameters with a different output length.
    #[must_use]
    pub const fn with_len(self, len: usize) -> Self {
        Self { len, ..self }
    }

    /// Validate parameters are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] if `N` is not a power of two
    /// greater than 1 or `r`/`p` is zero, and [`CryptoError::KdfFailure`]
    /// if `len` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(CryptoError::invalid_argument(
                "N must be a power of two greater than 1",
            ));
        }
        if self.r == 0 || self.p == 0 {
            return Err(CryptoError::invalid_argument("r and p must be at least 1"));
        }
        if self.len == 0 {
            return Err(CryptoError::KdfFailure(
                "length is not a positive integer".into(),
            ));
        }
        Ok(())
    }

    fn build_scrypt_params(&self) -> Result<scrypt::Params> {
        self.validate()?;

        let log_n = u8::try_from(self.n.trailing_zeros())
            .map_err(|_| CryptoError::invalid_argument("N out of range"))?;

        scrypt::Params::new(log_n, self.r, self.p, PARAMS_LEN)
            .map_err(|e| CryptoError::InvalidArgument(format!("scrypt params: {e}")))
    }
}

/// Password or raw key material fed into the KDF.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Used verbatim
    Bytes(Vec<u8>),
    /// NFKC-normalized, then UTF-8 encoded
    Text(String),
}

impl KeyInput {
    /// Canonical byte form.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            KeyInput::Bytes(bytes) => Zeroizing::new(bytes.clone()),
            KeyInput::Text(text) => Zeroizing::new(text.nfkc().collect::<String>().into_bytes()),
        }
    }

    /// Whether the canonical byte form is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            KeyInput::Bytes(bytes) => bytes.is_empty(),
            KeyInput::Text(text) => text.nfkc().next().is_none(),
        }
    }
}

impl std::fmt::Debug for KeyInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyInput::Bytes(bytes) => write!(f, "KeyInput::Bytes(<{} bytes>)", bytes.len()),
            KeyInput::Text(_) => f.write_str("KeyInput::Text(<redacted>)"),
        }
    }
}

impl Drop for KeyInput {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        match self {
            KeyInput::Bytes(bytes) => bytes.zeroize(),
            KeyInput::Text(text) => text.zeroize(),
        }
    }
}

impl From<&str> for KeyInput {
    fn from(value: &str) -> Self {
        KeyInput::Text(value.to_owned())
    }
}

impl From<String> for KeyInput {
    fn from(value: String) -> Self {
        KeyInput::Text(value)
    }
}

impl From<&[u8]> for KeyInput {
    fn from(value: &[u8]) -> Self {
        KeyInput::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for KeyInput {
    fn from(value: Vec<u8>) -> Self {
        KeyInput::Bytes(value)
    }
}

impl From<u64> for KeyInput {
    /// Numeric passwords are stringified.
    fn from(value: u64) -> Self {
        KeyInput::Text(value.to_string())
    }
}

/// KDF salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaltInput {
    /// Used verbatim
    Bytes(Vec<u8>),
    /// Hex-decoded before use
    Hex(String),
}

impl SaltInput {
    /// Decoded salt bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEncoding`] if a hex salt is malformed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            SaltInput::Bytes(bytes) => Ok(bytes.clone()),
            SaltInput::Hex(text) => hex::decode(text)
                .map_err(|e| CryptoError::invalid_encoding(format!("salt: {e}"))),
        }
    }
}

impl From<&str> for SaltInput {
    fn from(value: &str) -> Self {
        SaltInput::Hex(value.to_owned())
    }
}

impl From<String> for SaltInput {
    fn from(value: String) -> Self {
        SaltInput::Hex(value)
    }
}

impl From<&[u8]> for SaltInput {
    fn from(value: &[u8]) -> Self {
        SaltInput::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for SaltInput {
    fn from(value: Vec<u8>) -> Self {
        SaltInput::Bytes(value)
    }
}

/// Where scrypt executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KdfBackend {
    /// On the tokio blocking pool
    #[default]
    Blocking,
    /// On the calling task
    Inline,
}

/// scrypt key derivation service.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kdf {
    backend: KdfBackend,
}

impl Kdf {
    /// Create a KDF service using `backend`.
    #[must_use]
    pub fn new(backend: KdfBackend) -> Self {
        Self { backend }
    }

    /// The configured backend.
    #[must_use]
    pub fn backend(&self) -> KdfBackend {
        self.backend
    }

    /// Derive `config.len` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the salt is malformed,
    /// or scrypt fails.
    pub async fn derive(
        &self,
        key: &KeyInput,
        salt: &SaltInput,
        config: &KdfConfig,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let key = key.to_bytes();
        let salt = salt.to_bytes()?;
        self.derive_bytes(key, salt, *config).await
    }

    /// Derive from already-canonical key and salt bytes.
    ///
    /// # Errors
    ///
    /// See [`Kdf::derive`].
    pub async fn derive_bytes(
        &self,
        key: Zeroizing<Vec<u8>>,
        salt: Vec<u8>,
        config: KdfConfig,
    ) -> Result<Zeroizing<Vec<u8>>> {
        config.validate()?;

        match self.backend {
            KdfBackend::Inline => scrypt_inline(&key, &salt, &config),
            KdfBackend::Blocking => match tokio::runtime::Handle::try_current() {
                Ok(handle) => handle
                    .spawn_blocking(move || scrypt_inline(&key, &salt, &config))
                    .await
                    .map_err(|e| CryptoError::KdfFailure(format!("worker failed: {e}")))?,
                Err(_) => {
                    tracing::warn!("no tokio runtime available, deriving key inline");
                    scrypt_inline(&key, &salt, &config)
                }
            },
        }
    }
}

/// Run scrypt synchronously.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidArgument`] for unusable cost parameters
/// and [`CryptoError::KdfFailure`] if scrypt rejects the output length.
pub fn scrypt_inline(key: &[u8], salt: &[u8], config: &KdfConfig) -> Result<Zeroizing<Vec<u8>>> {
    let params = config.build_scrypt_params()?;

    let mut output = Zeroizing::new(vec![0u8; config.len]);
    scrypt::scrypt(key, salt, &params, &mut output)
        .map_err(|e| CryptoError::KdfFailure(e.to_string()))?;

    tracing::trace!(
        n = config.n,
        r = config.r,
        p = config.p,
        len = config.len,
        "derived key material"
    );

    Ok(output)
}
