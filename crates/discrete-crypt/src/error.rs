//! Cryptographic error types.

use std::fmt;

use thiserror::Error;

/// Which half of a keypair an operation was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The public value `g^x mod p`
    Public,
    /// The secret exponent `x`
    Private,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Public => f.write_str("public"),
            KeyKind::Private => f.write_str("private"),
        }
    }
}

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Out-of-range or malformed argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A key required by the operation is not set
    #[error("{0} key not set")]
    MissingKey(KeyKind),

    /// Password-derived public key does not match the stored one
    #[error("incorrect key")]
    IncorrectKey,

    /// Symmetric mode called without an input key
    #[error("no input key provided")]
    NoInputKey,

    /// Symmetric mode input key normalized to zero bytes
    #[error("input key empty")]
    EmptyInputKey,

    /// Envelope failed authentication
    #[error("decryption failed: authentication failure")]
    DecryptionFailed,

    /// Signature is incomplete or does not match the data
    #[error("signature not verified")]
    SignatureNotVerified,

    /// The key derivation function reported an error
    #[error("key derivation failed: {0}")]
    KdfFailure(String),

    /// A hex, decimal or JSON record could not be decoded
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Application payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Random number generation failed
    #[error("random number generation failed")]
    RandomFailed,
}

impl CryptoError {
    /// Create an [`CryptoError::InvalidArgument`]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CryptoError::InvalidArgument(msg.into())
    }

    /// Create an [`CryptoError::InvalidEncoding`]
    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        CryptoError::InvalidEncoding(msg.into())
    }

    /// Whether this error is a failed cryptographic check (wrong key,
    /// tampered envelope, forged signature) rather than a usage error.
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::IncorrectKey
                | CryptoError::DecryptionFailed
                | CryptoError::SignatureNotVerified
        )
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::Serialization(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CryptoError>;
