//! Password-keyed encryption.
//!
//! Same envelope construction as the DH transport, with the password bytes
//! as the base secret. Envelopes carry no `public` field.

use serde::Serialize;
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use crate::context::Context;
use crate::envelope::{self, Envelope};
use crate::error::{CryptoError, Result};
use crate::kdf::{KdfConfig, KeyInput};

/// Password-keyed encrypt/decrypt.
///
/// Without an explicit configuration the worst-case [`KdfConfig::default`]
/// cost is used, since the key is assumed to be a human password.
#[derive(Debug, Clone, Copy)]
pub struct Symmetric;

impl Symmetric {
    /// Encrypt a serializable message under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NoInputKey`] or [`CryptoError::EmptyInputKey`]
    /// for an absent or empty key, and [`CryptoError::Serialization`] if
    /// `message` cannot be encoded.
    pub async fn encrypt<T: Serialize + ?Sized>(
        ctx: &Context,
        key: Option<&KeyInput>,
        message: &T,
        config: Option<KdfConfig>,
    ) -> Result<Envelope> {
        let plaintext = Zeroizing::new(serde_json::to_vec(message)?);
        Self::encrypt_raw(ctx, key, &plaintext, config).await
    }

    /// Encrypt raw bytes under `key`.
    ///
    /// # Errors
    ///
    /// See [`Symmetric::encrypt`].
    pub async fn encrypt_raw(
        ctx: &Context,
        key: Option<&KeyInput>,
        plaintext: &[u8],
        config: Option<KdfConfig>,
    ) -> Result<Envelope> {
        let base = input_key(key)?;
        envelope::seal(ctx.kdf(), &base, plaintext, &config.unwrap_or_default()).await
    }

    /// Decrypt and deserialize an envelope sealed under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] on a wrong key, wrong cost
    /// or tampered envelope, plus the key errors of [`Symmetric::encrypt`].
    pub async fn decrypt<T: DeserializeOwned>(
        ctx: &Context,
        key: Option<&KeyInput>,
        envelope: &Envelope,
        config: Option<KdfConfig>,
    ) -> Result<T> {
        let plaintext = Self::decrypt_raw(ctx, key, envelope, config).await?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// Decrypt an envelope sealed under `key` to raw bytes.
    ///
    /// # Errors
    ///
    /// See [`Symmetric::decrypt`].
    pub async fn decrypt_raw(
        ctx: &Context,
        key: Option<&KeyInput>,
        envelope: &Envelope,
        config: Option<KdfConfig>,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let base = input_key(key)?;
        envelope::unseal(ctx.kdf(), &base, envelope, &config.unwrap_or_default()).await
    }
}

fn input_key(key: Option<&KeyInput>) -> Result<Zeroizing<Vec<u8>>> {
    let bytes = key.ok_or(CryptoError::NoInputKey)?.to_bytes();
    if bytes.is_empty() {
        return Err(CryptoError::EmptyInputKey);
    }
    Ok(bytes)
}
