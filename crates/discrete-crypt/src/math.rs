//! Arbitrary precision modular arithmetic.
//!
//! Thin layer over `num-bigint` providing the operations the protocol
//! needs: square-and-multiply exponentiation with signed exponents,
//! modular inverses and the decimal/hex codecs used by the wire formats.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer as _;
use num_traits::{One, Zero};

use crate::error::{CryptoError, Result};

/// An integer argument in any of the accepted input forms.
///
/// Resolved once at the API boundary via [`Integer::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integer {
    /// Already a big integer
    Native(BigUint),
    /// Base-10 string
    Decimal(String),
    /// Machine integer
    Small(u64),
}

impl Integer {
    /// Normalize to a [`BigUint`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidEncoding`] if a decimal string is malformed.
    pub fn resolve(self) -> Result<BigUint> {
        match self {
            Integer::Native(value) => Ok(value),
            Integer::Decimal(text) => parse_decimal(&text),
            Integer::Small(value) => Ok(BigUint::from(value)),
        }
    }
}

impl From<BigUint> for Integer {
    fn from(value: BigUint) -> Self {
        Integer::Native(value)
    }
}

impl From<&BigUint> for Integer {
    fn from(value: &BigUint) -> Self {
        Integer::Native(value.clone())
    }
}

impl From<&str> for Integer {
    fn from(value: &str) -> Self {
        Integer::Decimal(value.to_owned())
    }
}

impl From<String> for Integer {
    fn from(value: String) -> Self {
        Integer::Decimal(value)
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Integer::Small(value)
    }
}

/// Compute `base^exponent mod modulus`.
///
/// A negative exponent is evaluated as the modular inverse of
/// `base^|exponent|`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidArgument`] if `modulus` is zero, or if the
/// exponent is negative and `base` is not invertible modulo `modulus`.
pub fn mod_pow(base: &BigUint, exponent: &BigInt, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(CryptoError::invalid_argument("modulus must be positive"));
    }
    if modulus.is_one() {
        return Ok(BigUint::zero());
    }

    let raised = base.modpow(exponent.magnitude(), modulus);

    match exponent.sign() {
        Sign::Minus => mod_inverse(&raised, modulus),
        _ => Ok(raised),
    }
}

/// Compute `base^exponent mod modulus` for a non-negative exponent.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidArgument`] if `modulus` is zero.
pub fn mod_pow_unsigned(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(CryptoError::invalid_argument("modulus must be positive"));
    }
    Ok(base.modpow(exponent, modulus))
}

/// Generic entry point accepting any [`Integer`] form.
///
/// # Errors
///
/// Propagates decoding errors and the conditions of [`mod_pow_unsigned`].
pub fn mod_pow_any(
    base: impl Into<Integer>,
    exponent: impl Into<Integer>,
    modulus: impl Into<Integer>,
) -> Result<BigUint> {
    let base = base.into().resolve()?;
    let exponent = exponent.into().resolve()?;
    let modulus = modulus.into().resolve()?;
    mod_pow_unsigned(&base, &exponent, &modulus)
}

/// Compute the inverse of `value` modulo `modulus`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidArgument`] if the modulus is zero or
/// `gcd(value, modulus) != 1`.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(CryptoError::invalid_argument("modulus must be positive"));
    }

    let m = BigInt::from(modulus.clone());
    let a = BigInt::from(value % modulus);
    let egcd = a.extended_gcd(&m);

    if !egcd.gcd.is_one() {
        return Err(CryptoError::invalid_argument(
            "value is not invertible for this modulus",
        ));
    }

    egcd.x
        .mod_floor(&m)
        .to_biguint()
        .ok_or_else(|| CryptoError::invalid_argument("inverse out of range"))
}

/// Parse a base-10 unsigned integer.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidEncoding`] on empty or non-decimal input.
pub fn parse_decimal(text: &str) -> Result<BigUint> {
    BigUint::parse_bytes(text.as_bytes(), 10)
        .ok_or_else(|| CryptoError::invalid_encoding(format!("not a decimal integer: {text:?}")))
}

/// Parse a base-16 unsigned integer.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidEncoding`] on empty or non-hex input.
pub fn parse_hex(text: &str) -> Result<BigUint> {
    BigUint::parse_bytes(text.as_bytes(), 16)
        .ok_or_else(|| CryptoError::invalid_encoding(format!("not a hex integer: {text:?}")))
}

/// Parse a base-16 signed integer (leading `-` allowed).
///
/// # Errors
///
/// Returns [`CryptoError::InvalidEncoding`] on empty or non-hex input.
pub fn parse_hex_signed(text: &str) -> Result<BigInt> {
    BigInt::parse_bytes(text.as_bytes(), 16)
        .ok_or_else(|| CryptoError::invalid_encoding(format!("not a hex integer: {text:?}")))
}

/// Lowercase hex of an unsigned integer, without padding.
#[must_use]
pub fn to_hex(value: &BigUint) -> String {
    value.to_str_radix(16)
}

/// Lowercase hex of a signed integer; negatives carry a leading `-`.
#[must_use]
pub fn to_hex_signed(value: &BigInt) -> String {
    value.to_str_radix(16)
}

/// Decode an unpadded hex integer into bytes, pairing digits from the left.
///
/// A trailing unpaired nibble of odd-length input is dropped, so `"abc"`
/// decodes to `[0xab]`. Shared DH values enter the KDF in this form.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidEncoding`] on non-hex input.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>> {
    if !text.is_ascii() {
        return Err(CryptoError::invalid_encoding("hex: non-ascii input"));
    }
    let even = &text[..text.len() - text.len() % 2];
    hex::decode(even).map_err(|e| CryptoError::invalid_encoding(format!("hex: {e}")))
}

/// Serde adapter storing a [`BigUint`] as a decimal string.
pub(crate) mod serde_decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(deserializer)?;
        BigUint::parse_bytes(text.as_bytes(), 10)
            .ok_or_else(|| D::Error::custom(format!("not a decimal integer: {text:?}")))
    }
}
