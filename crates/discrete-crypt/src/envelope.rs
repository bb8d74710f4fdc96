//! Authenticated encryption envelope.
//!
//! One construction protects both DH exchanges and password-keyed
//! symmetric messages; only the origin of the base secret differs.
//!
//! ## Construction
//!
//! ```text
//! session  = random(32)
//! tag      = HMAC-SHA256(session, plaintext)
//! kek      = scrypt(base_secret, salt = tag, cfg.N, cfg.r, cfg.p, 32)
//! nonce    = tag[..16]
//! key      = AES-256-CTR(kek, nonce, session)
//! payload  = AES-256-CTR(session, nonce, plaintext)
//! ```
//!
//! The HMAC tag is at once the authenticator, the CTR initial counter
//! block and the KDF salt. Opening reverses the two CTR layers and rejects
//! unless the recomputed tag matches in constant time.
//!
//! ## Wire format
//!
//! ```json
//! { "payload": "<hex>", "key": "<hex>", "hmac": "<64 hex>", "public": "<hex>" }
//! ```
//!
//! `public` is present only on DH exchanges and identifies the sender.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};
use crate::kdf::{Kdf, KdfConfig};
use crate::random;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// HMAC-SHA256 tag size (32 bytes).
pub const TAG_SIZE: usize = 32;

/// AES-CTR initial counter block size (16 bytes).
pub const NONCE_SIZE: usize = 16;

/// Session and key-encryption key size (32 bytes / AES-256).
pub const KEY_SIZE: usize = 32;

/// Serialized encrypted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Encrypted payload, hex
    pub payload: String,
    /// Encrypted session key, hex
    pub key: String,
    /// HMAC-SHA256 of the plaintext under the session key, hex
    pub hmac: String,
    /// Sender public key, hex (DH exchanges only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
}

impl Envelope {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEncoding`] if the text is not an envelope.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CryptoError::invalid_encoding(format!("envelope: {e}")))
    }
}

/// Message authentication tag (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag([u8; TAG_SIZE]);

impl Tag {
    /// HMAC-SHA256 of `message` keyed with `key`.
    ///
    /// # Errors
    ///
    /// Never fails for HMAC-SHA256 in practice; the error path exists
    /// because the MAC constructor is fallible.
    pub fn compute(key: &[u8], message: &[u8]) -> Result<Self> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
            .map_err(|_| CryptoError::invalid_argument("HMAC key"))?;
        mac.update(message);
        Ok(Self(mac.finalize().into_bytes().into()))
    }

    /// Parse a tag from its lowercase hex form.
    ///
    /// Uppercase digits are rejected; the wire form is exactly what
    /// [`Tag::to_hex`] produces.
    #[must_use]
    pub fn from_hex(text: &str) -> Option<Self> {
        if text.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let bytes = hex::decode(text).ok()?;
        let array: [u8; TAG_SIZE] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    /// Lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }

    /// The CTR initial counter block: the first 16 bytes of the tag.
    #[must_use]
    pub fn nonce(&self) -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&self.0[..NONCE_SIZE]);
        nonce
    }

    /// Constant-time comparison.
    #[must_use]
    #[inline(never)]
    pub fn verify(&self, other: &Tag) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

/// XOR the AES-256-CTR keystream into `data`.
fn apply_ctr(key: &[u8], nonce: &[u8; NONCE_SIZE], data: &mut [u8]) -> Result<()> {
    let mut cipher = Aes256Ctr::new_from_slices(key, nonce)
        .map_err(|_| CryptoError::invalid_argument("AES-256 key must be 32 bytes"))?;
    cipher.apply_keystream(data);
    Ok(())
}

/// Encrypt `plaintext` under `base_secret`.
///
/// `config` supplies the scrypt cost; its output length is overridden to
/// [`KEY_SIZE`]. The returned envelope has no `public` field.
///
/// # Errors
///
/// Returns an error if randomness is unavailable or key derivation fails.
pub async fn seal(
    kdf: &Kdf,
    base_secret: &[u8],
    plaintext: &[u8],
    config: &KdfConfig,
) -> Result<Envelope> {
    let session = Zeroizing::new(random::random_32()?);
    let tag = Tag::compute(&session[..], plaintext)?;
    let nonce = tag.nonce();

    let kek = kdf
        .derive_bytes(
            Zeroizing::new(base_secret.to_vec()),
            tag.as_bytes().to_vec(),
            config.with_len(KEY_SIZE),
        )
        .await?;

    let mut key = session.to_vec();
    apply_ctr(&kek, &nonce, &mut key)?;

    let mut payload = plaintext.to_vec();
    apply_ctr(&session[..], &nonce, &mut payload)?;

    Ok(Envelope {
        payload: hex::encode(payload),
        key: hex::encode(key),
        hmac: tag.to_hex(),
        public: None,
    })
}

/// Decrypt and authenticate an envelope produced by [`seal`].
///
/// # Errors
///
/// Returns [`CryptoError::DecryptionFailed`] if any field is malformed or
/// the tag does not match. Key derivation errors are propagated.
pub async fn unseal(
    kdf: &Kdf,
    base_secret: &[u8],
    envelope: &Envelope,
    config: &KdfConfig,
) -> Result<Zeroizing<Vec<u8>>> {
    let Some(claimed) = Tag::from_hex(&envelope.hmac) else {
        tracing::debug!("rejecting envelope: malformed tag");
        return Err(CryptoError::DecryptionFailed);
    };
    let (Ok(mut session), Ok(payload)) = (hex::decode(&envelope.key), hex::decode(&envelope.payload))
    else {
        tracing::debug!("rejecting envelope: malformed hex");
        return Err(CryptoError::DecryptionFailed);
    };
    if session.len() != KEY_SIZE {
        tracing::debug!(len = session.len(), "rejecting envelope: bad session key length");
        return Err(CryptoError::DecryptionFailed);
    }

    let nonce = claimed.nonce();
    let kek = kdf
        .derive_bytes(
            Zeroizing::new(base_secret.to_vec()),
            claimed.as_bytes().to_vec(),
            config.with_len(KEY_SIZE),
        )
        .await?;

    apply_ctr(&kek, &nonce, &mut session)?;
    let session = Zeroizing::new(session);

    let mut plaintext = Zeroizing::new(payload);
    apply_ctr(&session, &nonce, &mut plaintext)?;

    let actual = Tag::compute(&session, &plaintext)?;
    if !actual.verify(&claimed) {
        tracing::debug!("rejecting envelope: authentication failure");
        return Err(CryptoError::DecryptionFailed);
    }

    Ok(plaintext)
}
