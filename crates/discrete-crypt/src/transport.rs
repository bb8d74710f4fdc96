//! Diffie-Hellman exchange transport.
//!
//! `exchange` encrypts for a recipient using the DH value
//! `receiver.public^sender.private mod p` as the envelope base secret;
//! `open` recomputes it as `sender.public^receiver.private mod p` from the
//! sender key carried in the envelope. Both run the envelope KDF with the
//! *receiver's* cost parameters.
//!
//! Shared values are memoized in the context's [`ExchangeCache`] under
//! `(sender, receiver)` decimal public keys, so the receiver of a message
//! sealed through the same context hits the entry written by the sender.
//!
//! [`ExchangeCache`]: crate::cache::ExchangeCache

use num_bigint::BigUint;
use serde::Serialize;
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use crate::contact::Contact;
use crate::context::Context;
use crate::envelope::{self, Envelope};
use crate::error::{CryptoError, KeyKind, Result};
use crate::math;

impl Context {
    /// Hex DH value between `local`'s private exponent and `peer`'s public
    /// value, cached under `(local, peer)`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] if `local` has no private
    /// exponent or either side has no public value.
    pub fn shared_secret(&self, local: &Contact, peer: &Contact) -> Result<String> {
        let private = local.private_key()?;
        let local_public = local.public_key()?;
        let peer_public = peer.public_key()?;

        self.memoized_secret(
            local_public,
            peer_public,
            peer_public,
            private,
            &local.group().prime,
        )
    }

    /// Look up `(first, second)` or compute `base^private mod prime`.
    fn memoized_secret(
        &self,
        first: &BigUint,
        second: &BigUint,
        base: &BigUint,
        private: &BigUint,
        prime: &BigUint,
    ) -> Result<String> {
        let first = first.to_str_radix(10);
        let second = second.to_str_radix(10);

        self.cache().get_or_insert_with(&first, &second, || {
            let shared = math::mod_pow_unsigned(base, private, prime)?;
            Ok(math::to_hex(&shared))
        })
    }

    /// Encrypt a serializable message from `sender` to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if `message` cannot be
    /// encoded, plus the failures of [`Context::exchange_raw`].
    pub async fn exchange<T: Serialize + ?Sized>(
        &self,
        sender: &Contact,
        receiver: &Contact,
        message: &T,
    ) -> Result<Envelope> {
        let plaintext = Zeroizing::new(serde_json::to_vec(message)?);
        self.exchange_raw(sender, receiver, &plaintext).await
    }

    /// Encrypt raw bytes from `sender` to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] if the sender has no private
    /// exponent or either party has no public value. KDF errors are
    /// propagated.
    pub async fn exchange_raw(
        &self,
        sender: &Contact,
        receiver: &Contact,
        plaintext: &[u8],
    ) -> Result<Envelope> {
        let secret = Zeroizing::new(self.shared_secret(sender, receiver)?);
        let base = Zeroizing::new(math::hex_to_bytes(&secret)?);

        let mut envelope =
            envelope::seal(self.kdf(), &base, plaintext, &receiver.kdf_config()).await?;
        envelope.public = Some(math::to_hex(sender.public_key()?));

        tracing::trace!(len = plaintext.len(), "sealed exchange envelope");
        Ok(envelope)
    }

    /// Decrypt and deserialize an envelope addressed to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if the plaintext is not a
    /// valid `T`, plus the failures of [`Context::open_raw`].
    pub async fn open<T: DeserializeOwned>(&self, receiver: &Contact, envelope: &Envelope) -> Result<T> {
        let plaintext = self.open_raw(receiver, envelope).await?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// Decrypt an envelope addressed to `receiver` to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MissingKey`] if the envelope carries no sender
    /// key or the receiver has no private exponent, and
    /// [`CryptoError::DecryptionFailed`] if authentication fails.
    pub async fn open_raw(
        &self,
        receiver: &Contact,
        envelope: &Envelope,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let sender_hex = envelope
            .public
            .as_deref()
            .ok_or(CryptoError::MissingKey(KeyKind::Public))?;
        let sender_public = math::parse_hex(sender_hex).map_err(|_| {
            tracing::debug!("rejecting envelope: malformed sender key");
            CryptoError::DecryptionFailed
        })?;

        let private = receiver.private_key()?;
        let receiver_public = receiver.public_key()?;

        let secret = Zeroizing::new(self.memoized_secret(
            &sender_public,
            receiver_public,
            &sender_public,
            private,
            &receiver.group().prime,
        )?);
        let base = Zeroizing::new(math::hex_to_bytes(&secret)?);

        envelope::unseal(self.kdf(), &base, envelope, &receiver.kdf_config()).await
    }
}
