//! Discrete-log identities.
//!
//! A [`Contact`] is a keypair `(x, g^x mod p)` where the secret exponent `x`
//! is stretched from a password (or 32 random bytes) with scrypt:
//!
//! ```text
//! x = int_be(scrypt(password, salt, N, r, p, len)) mod p
//! y = g^x mod p
//! ```
//!
//! Exported records carry the salt, public value, group and KDF cost but
//! never the private exponent. Holding the password, the private exponent
//! can be recomputed from a record with [`Contact::compute`], which fails
//! with [`CryptoError::IncorrectKey`] unless it reproduces the stored
//! public value.
//!
//! ## Example
//!
//! ```ignore
//! let ctx = Context::new();
//! let alice = Contact::create(&ctx, CreateOptions::new().password("hunter2")).await?;
//! let record = alice.export(&ExportOptions::default())?;
//!
//! let mut restored = Contact::import(&record)?;
//! restored.compute(&ctx, "hunter2").await?;
//! ```

use std::fmt;

use num_bigint::BigUint;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::envelope::Envelope;
use crate::error::{CryptoError, KeyKind, Result};
use crate::group::GroupParams;
use crate::kdf::{KdfConfig, KeyInput, SaltInput};
use crate::math;
use crate::random;
use crate::signature::{self, Signature};

/// Discrete-log identity.
#[derive(Clone)]
pub struct Contact {
    salt: String,
    private: Option<BigUint>,
    public: Option<BigUint>,
    params: Option<GroupParams>,
    kdf_config: Option<KdfConfig>,
}

impl fmt::Debug for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contact")
            .field("salt", &self.salt)
            .field("private", &self.private.as_ref().map(|_| "<redacted>"))
            .field("public", &self.public.as_ref().map(|p| p.bits()))
            .field("params", &self.params.is_some())
            .field("kdf_config", &self.kdf_config)
            .finish()
    }
}

/// Serialized contact.
///
/// Keys are `salt`, `public`, `params` and `kdfConfig`; numbers are decimal
/// strings. There is no field for the private exponent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactRecord {
    /// KDF salt, hex
    #[serde(default)]
    pub salt: String,
    /// Public value, decimal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
    /// Group parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<GroupParams>,
    /// scrypt cost used for the private exponent
    #[serde(
        rename = "kdfConfig",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kdf_config: Option<KdfConfig>,
}

/// Inputs to [`Contact::create`].
///
/// Every field is optional:
///
/// | Field | When absent |
/// |-------|-------------|
/// | `password` | 32 random bytes |
/// | `salt` | 16 random bytes, hex |
/// | `kdf_config` | [`KdfConfig::default`] with a password, [`KdfConfig::ephemeral`] without |
/// | `params` | [`GroupParams::default`] |
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    password: Option<KeyInput>,
    salt: Option<String>,
    kdf_config: Option<KdfConfig>,
    params: Option<GroupParams>,
}

impl CreateOptions {
    /// All defaults: a random identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the private exponent from a password. Empty passwords are
    /// treated as absent.
    #[must_use]
    pub fn password(mut self, password: impl Into<KeyInput>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Hex-encoded salt.
    #[must_use]
    pub fn salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// scrypt cost.
    #[must_use]
    pub fn kdf_config(mut self, config: KdfConfig) -> Self {
        self.kdf_config = Some(config);
        self
    }

    /// Group parameters.
    #[must_use]
    pub fn params(mut self, params: GroupParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// What to strip when exporting or cleaning a contact.
///
/// The private exponent is always stripped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Remove the group parameters
    pub params: bool,
    /// Remove the KDF configuration
    pub kdf_config: bool,
}

impl ExportOptions {
    /// Remove everything optional.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            params: true,
            kdf_config: true,
        }
    }

    /// Remove the group parameters.
    #[must_use]
    pub const fn without_params(mut self) -> Self {
        self.params = true;
        self
    }

    /// Remove the KDF configuration.
    #[must_use]
    pub const fn without_kdf_config(mut self) -> Self {
        self.kdf_config = true;
        self
    }
}

impl Contact {
    /// Generate a new identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters or KDF configuration are invalid,
    /// the salt is not hex, or randomness is unavailable.
    pub async fn create(ctx: &Context, options: CreateOptions) -> Result<Self> {
        let password = options.password.filter(|p| !p.is_empty());

        let kdf_config = options.kdf_config.unwrap_or(if password.is_some() {
            KdfConfig::default()
        } else {
            KdfConfig::ephemeral()
        });
        let params = options.params.unwrap_or_default();
        params.validate()?;

        let salt = match options.salt {
            Some(salt) => salt,
            None => random::random_salt_hex()?,
        };
        let key = match password {
            Some(password) => password,
            None => KeyInput::Bytes(random::random_32()?.to_vec()),
        };

        let private = derive_private(ctx, &key, &salt, &kdf_config, &params).await?;
        let public = params.public_for(&private)?;

        tracing::debug!(bits = public.bits(), "created contact");

        Ok(Self {
            salt,
            private: Some(private),
            public: Some(public),
            params: Some(params),
            kdf_config: Some(kdf_config),
        })
    }

    /// Recompute the private exponent from `password`.
    ///
    /// Uses the contact's own salt, group and KDF cost. On any failure the
    /// private exponent is left unset.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IncorrectKey`] if the derived public value
    /// differs from the stored one, and [`CryptoError::MissingKey`] if the
    /// contact has no public value to check against.
    pub async fn compute(&mut self, ctx: &Context, password: impl Into<KeyInput>) -> Result<&mut Self> {
        self.private = None;

        let expected = self.public_key()?.clone();
        let params = self.group().clone();
        params.validate()?;
        let config = self.kdf_config();

        let private = derive_private(ctx, &password.into(), &self.salt, &config, &params).await?;

        if params.public_for(&private)? != expected {
            tracing::warn!("password does not reproduce the stored public key");
            return Err(CryptoError::IncorrectKey);
        }

        self.private = Some(private);
        Ok(self)
    }

    /// The public value `g^x mod p`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] if the contact has none.
    pub fn public_key(&self) -> Result<&BigUint> {
        self.public
            .as_ref()
            .ok_or(CryptoError::MissingKey(KeyKind::Public))
    }

    /// The secret exponent `x`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] if the contact was imported or
    /// cleaned and not recomputed.
    pub fn private_key(&self) -> Result<&BigUint> {
        self.private
            .as_ref()
            .ok_or(CryptoError::MissingKey(KeyKind::Private))
    }

    /// Whether the private exponent is available.
    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.private.is_some()
    }

    /// KDF salt, hex.
    #[must_use]
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Group in effect, falling back to the default group.
    #[must_use]
    pub fn group(&self) -> &GroupParams {
        self.params.as_ref().unwrap_or_else(|| GroupParams::default_ref())
    }

    /// KDF cost in effect, falling back to [`KdfConfig::default`].
    #[must_use]
    pub fn kdf_config(&self) -> KdfConfig {
        self.kdf_config.unwrap_or_default()
    }

    /// Explicitly stored group, if any.
    #[must_use]
    pub fn params(&self) -> Option<&GroupParams> {
        self.params.as_ref()
    }

    /// Replace the group parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] if `params` fail
    /// [`GroupParams::validate`]; the stored group is left unchanged.
    pub fn set_params(&mut self, params: GroupParams) -> Result<&mut Self> {
        params.validate()?;
        self.params = Some(params);
        Ok(self)
    }

    /// Replace the KDF configuration.
    pub fn set_kdf_config(&mut self, config: KdfConfig) -> &mut Self {
        self.kdf_config = Some(config);
        self
    }

    /// Shareable record without the private exponent.
    #[must_use]
    pub fn export_record(&self, options: &ExportOptions) -> ContactRecord {
        ContactRecord {
            salt: self.salt.clone(),
            public: self.public.as_ref().map(|p| p.to_str_radix(10)),
            params: if options.params { None } else { self.params.clone() },
            kdf_config: if options.kdf_config { None } else { self.kdf_config },
        }
    }

    /// JSON form of [`Contact::export_record`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if encoding fails.
    pub fn export(&self, options: &ExportOptions) -> Result<String> {
        Ok(serde_json::to_string(&self.export_record(options))?)
    }

    /// Rebuild a contact from a record. The result has no private exponent.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEncoding`] if the public value is not
    /// a decimal integer, and [`CryptoError::InvalidArgument`] if the
    /// record carries group parameters that fail [`GroupParams::validate`].
    pub fn from_record(record: ContactRecord) -> Result<Self> {
        let public = record
            .public
            .as_deref()
            .map(math::parse_decimal)
            .transpose()?;
        if let Some(params) = &record.params {
            params.validate()?;
        }

        Ok(Self {
            salt: record.salt,
            private: None,
            public,
            params: record.params,
            kdf_config: record.kdf_config,
        })
    }

    /// Parse a contact from its JSON record.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEncoding`] if the JSON is malformed.
    pub fn import(json: &str) -> Result<Self> {
        let record: ContactRecord = serde_json::from_str(json)
            .map_err(|e| CryptoError::invalid_encoding(format!("contact: {e}")))?;
        Self::from_record(record)
    }

    /// Strip the private exponent, and optionally the group and KDF cost.
    pub fn clean(&mut self, options: &ExportOptions) -> &mut Self {
        self.private = None;
        if options.params {
            self.params = None;
        }
        if options.kdf_config {
            self.kdf_config = None;
        }
        self
    }

    /// Encrypt `message` for `recipient`.
    ///
    /// # Errors
    ///
    /// See [`Context::exchange`].
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        recipient: &Contact,
        message: &T,
    ) -> Result<Envelope> {
        ctx.exchange(self, recipient, message).await
    }

    /// Decrypt an envelope addressed to this contact.
    ///
    /// # Errors
    ///
    /// See [`Context::open`].
    pub async fn open<T: DeserializeOwned>(&self, ctx: &Context, envelope: &Envelope) -> Result<T> {
        ctx.open(self, envelope).await
    }

    /// Sign `data` with this contact's private exponent.
    ///
    /// # Errors
    ///
    /// See [`signature::sign`].
    pub async fn sign<T: Serialize + Clone>(
        &self,
        ctx: &Context,
        data: &T,
        bundle: bool,
    ) -> Result<Signature<T>> {
        signature::sign(ctx, self, data, bundle).await
    }

    /// Verify a signature made by this contact.
    ///
    /// # Errors
    ///
    /// See [`signature::verify`].
    pub fn verify<T: Serialize + Clone>(&self, signature: &Signature<T>, source: Option<&T>) -> Result<T> {
        signature::verify(self, signature, source)
    }
}

async fn derive_private(
    ctx: &Context,
    key: &KeyInput,
    salt: &str,
    config: &KdfConfig,
    params: &GroupParams,
) -> Result<BigUint> {
    params.validate()?;
    let secret = ctx
        .kdf()
        .derive(key, &SaltInput::Hex(salt.to_owned()), config)
        .await?;
    Ok(BigUint::from_bytes_be(&secret) % &params.prime)
}
