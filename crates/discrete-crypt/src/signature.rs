//! Deterministic-nonce Schnorr signatures.
//!
//! ## Signing
//!
//! ```text
//! d = json(data)
//! k = int_be(scrypt(d, salt = be(x), N = 32, r = 4, p = 1, len = ceil(|x| / 8) + 33))
//! R = g^k mod p
//! e = int_be(SHA-256(be(R) || d))
//! s = k - x * e                       (over the integers, may be negative)
//! ```
//!
//! The nonce is derived from the data and the private exponent, so signing
//! needs no entropy and never reuses `k` for different data. Its length
//! exceeds the private exponent plus the hash to keep `k` free of bias.
//!
//! ## Verification
//!
//! ```text
//! R' = g^s * y^e mod p                (negative s via modular inverse)
//! accept iff int_be(SHA-256(be(R') || d)) == e
//! ```
//!
//! since `g^(k - xe) * g^(xe) = g^k = R`.

use num_bigint::{BigInt, BigUint};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::contact::Contact;
use crate::context::Context;
use crate::error::{CryptoError, Result};
use crate::kdf::KdfConfig;
use crate::math;

/// scrypt cost of the nonce derivation. The output length is set per
/// signature.
pub const NONCE_KDF: KdfConfig = KdfConfig::new(32, 4, 1, 32);

/// Bytes of nonce beyond the private exponent's length.
const NONCE_EXTRA_BYTES: usize = 32 + 1;

/// Schnorr signature, optionally bundling the signed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature<T> {
    /// Response `k - x*e`, signed hex
    #[serde(default)]
    pub s: String,
    /// Challenge hash, hex
    #[serde(default)]
    pub e: String,
    /// Signed value, when bundled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Signature<T> {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> Signature<T> {
    /// Decode from JSON. Missing `s`/`e` decode as empty and fail
    /// verification.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEncoding`] on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| CryptoError::invalid_encoding(format!("signature: {e}")))
    }
}

/// `SHA-256(be(r) || data)` as an integer.
fn challenge(r: &BigUint, data: &[u8]) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(r.to_bytes_be());
    hasher.update(data);
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Sign `data` with `signer`'s private exponent.
///
/// # Errors
///
/// Returns [`CryptoError::MissingKey`] if the signer has no private
/// exponent and [`CryptoError::Serialization`] if `data` cannot be encoded.
pub async fn sign<T: Serialize + Clone>(
    ctx: &Context,
    signer: &Contact,
    data: &T,
    bundle: bool,
) -> Result<Signature<T>> {
    let private = signer.private_key()?;
    let params = signer.group();
    params.validate()?;
    let encoded = serde_json::to_vec(data)?;

    let nonce_len = usize::try_from(private.bits().div_ceil(8))
        .map_err(|_| CryptoError::invalid_argument("private key too large"))?
        + NONCE_EXTRA_BYTES;

    let nonce_bytes = ctx
        .kdf()
        .derive_bytes(
            Zeroizing::new(encoded.clone()),
            private.to_bytes_be(),
            NONCE_KDF.with_len(nonce_len),
        )
        .await?;
    let k = BigUint::from_bytes_be(&nonce_bytes);

    let r = math::mod_pow_unsigned(&params.generator, &k, &params.prime)?;
    let e = challenge(&r, &encoded);
    let s = BigInt::from(k) - BigInt::from(private * &e);

    Ok(Signature {
        s: math::to_hex_signed(&s),
        e: math::to_hex(&e),
        data: bundle.then(|| data.clone()),
    })
}

/// Verify a signature by `signer`, returning the verified value.
///
/// The value checked is `source` if given, else the bundled data.
///
/// # Errors
///
/// Returns [`CryptoError::SignatureNotVerified`] if `s` or `e` is missing
/// or malformed, no data is available, or the challenge does not match.
pub fn verify<T: Serialize + Clone>(
    signer: &Contact,
    signature: &Signature<T>,
    source: Option<&T>,
) -> Result<T> {
    if signature.s.is_empty() || signature.e.is_empty() {
        tracing::debug!("rejecting signature: missing s or e");
        return Err(CryptoError::SignatureNotVerified);
    }
    let data = source
        .or(signature.data.as_ref())
        .ok_or(CryptoError::SignatureNotVerified)?;

    let (Ok(s), Ok(e)) = (
        math::parse_hex_signed(&signature.s),
        math::parse_hex(&signature.e),
    ) else {
        tracing::debug!("rejecting signature: malformed hex");
        return Err(CryptoError::SignatureNotVerified);
    };

    let public = signer.public_key()?;
    let params = signer.group();
    params.validate()?;
    let encoded = serde_json::to_vec(data)?;

    let gs = params.pow_generator(&s)?;
    let ye = math::mod_pow_unsigned(public, &e, &params.prime)?;
    let r = (gs * ye) % &params.prime;

    if challenge(&r, &encoded) != e {
        tracing::debug!("rejecting signature: challenge mismatch");
        return Err(CryptoError::SignatureNotVerified);
    }

    Ok(data.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{CreateOptions, ExportOptions};
    use crate::kdf::KdfBackend;

    fn ctx() -> Context {
        Context::builder().with_backend(KdfBackend::Inline).build()
    }

    async fn signer(ctx: &Context) -> Contact {
        Contact::create(ctx, CreateOptions::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_sign_verify_bundled() {
        let ctx = ctx();
        let alice = signer(&ctx).await;

        let signature = sign(&ctx, &alice, &"Hello, World".to_string(), true).await.unwrap();
        assert_eq!(signature.e.len(), 64);
        assert_eq!(signature.data.as_deref(), Some("Hello, World"));

        assert_eq!(verify(&alice, &signature, None).unwrap(), "Hello, World");
    }

    #[tokio::test]
    async fn test_sign_is_deterministic() {
        let ctx = ctx();
        let alice = signer(&ctx).await;

        let a = sign(&ctx, &alice, &42u32, false).await.unwrap();
        let b = sign(&ctx, &alice, &42u32, false).await.unwrap();
        let c = sign(&ctx, &alice, &43u32, false).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a.e, c.e);
    }

    #[tokio::test]
    async fn test_detached_signature() {
        let ctx = ctx();
        let alice = signer(&ctx).await;

        let signature = sign(&ctx, &alice, &vec![1u8, 2, 3], false).await.unwrap();
        assert!(signature.data.is_none());

        assert!(matches!(
            verify(&alice, &signature, None),
            Err(CryptoError::SignatureNotVerified)
        ));
        assert_eq!(verify(&alice, &signature, Some(&vec![1, 2, 3])).unwrap(), vec![1, 2, 3]);
        assert!(verify(&alice, &signature, Some(&vec![1, 2, 4])).is_err());
    }

    #[tokio::test]
    async fn test_source_overrides_bundle() {
        let ctx = ctx();
        let alice = signer(&ctx).await;

        let signature = sign(&ctx, &alice, &"real".to_string(), true).await.unwrap();
        assert!(verify(&alice, &signature, Some(&"fake".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_tampered_fields_rejected() {
        let ctx = ctx();
        let alice = signer(&ctx).await;
        let signature = sign(&ctx, &alice, &"data".to_string(), true).await.unwrap();

        let mut cases = Vec::new();
        for (s, e) in [
            ("0", signature.e.as_str()),
            (signature.s.as_str(), "0"),
            ("", signature.e.as_str()),
            (signature.s.as_str(), ""),
            ("zz", signature.e.as_str()),
        ] {
            cases.push(Signature {
                s: s.to_string(),
                e: e.to_string(),
                data: signature.data.clone(),
            });
        }

        let mut bumped = signature.clone();
        bumped.e = math::to_hex(&(math::parse_hex(&signature.e).unwrap() + 1u32));
        cases.push(bumped);

        for case in cases {
            assert!(matches!(
                verify(&alice, &case, None),
                Err(CryptoError::SignatureNotVerified)
            ));
        }
    }

    #[tokio::test]
    async fn test_other_signer_rejected() {
        let ctx = ctx();
        let alice = signer(&ctx).await;
        let bob = signer(&ctx).await;

        let signature = sign(&ctx, &alice, &"data".to_string(), true).await.unwrap();
        assert!(bob.verify(&signature, None).is_err());
    }

    #[tokio::test]
    async fn test_verify_with_public_only() {
        let ctx = ctx();
        let alice = signer(&ctx).await;
        let signature = alice.sign(&ctx, &"data".to_string(), true).await.unwrap();

        let public = Contact::import(&alice.export(&ExportOptions::default()).unwrap()).unwrap();
        assert_eq!(public.verify(&signature, None).unwrap(), "data");

        let result = public.sign(&ctx, &"data".to_string(), true).await;
        assert!(matches!(
            result,
            Err(CryptoError::MissingKey(crate::error::KeyKind::Private))
        ));
    }

    #[test]
    fn test_missing_fields_decode_empty() {
        let signature: Signature<String> = Signature::from_json(r#"{"data":"x"}"#).unwrap();
        assert!(signature.s.is_empty());
        assert!(signature.e.is_empty());
        assert_eq!(signature.data.as_deref(), Some("x"));
    }

    #[test]
    fn test_negative_response_verifies() {
        // Toy group p = 23, g = 5, x = 6, y = 5^6 mod 23 = 8. With k = 3 and
        // e forced by the hash, s = 3 - 6e is negative for any e > 0.
        let prime = BigUint::from(23u32);
        let generator = BigUint::from(5u32);
        let x = BigUint::from(6u32);
        let y = generator.modpow(&x, &prime);

        let k = BigUint::from(3u32);
        let r = generator.modpow(&k, &prime);
        let e = challenge(&r, b"\"toy\"");
        let s = BigInt::from(k) - BigInt::from(&x * &e);
        assert!(s < BigInt::from(0));

        let gs = math::mod_pow(&generator, &s, &prime).unwrap();
        let ye = y.modpow(&e, &prime);
        assert_eq!((gs * ye) % &prime, r);
    }
}
