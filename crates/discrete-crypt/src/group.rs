//! Group parameters and Pohlig-Hellman small-factor decomposition.
//!
//! Every deployment fixes one multiplicative group `Z_p^*` with generator
//! `g`. The protocol assumes `p` is a nearly-safe prime: `p - 1` is a
//! product of primes below a small bound times one large cofactor. The
//! embedded default has `p - 1 = 420 * q` with `q` a 3072-bit prime.

use std::sync::LazyLock;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};
use crate::math::{self, serde_decimal};

/// Default largest small factor stripped from `p - 1`.
pub const DEFAULT_FACTOR_BOUND: u64 = 4096;

/// Default generator.
pub const DEFAULT_GENERATOR: u64 = 2;

/// Default 3080-bit nearly-safe prime, base 10.
pub const DEFAULT_PRIME: &str = concat!(
    "12360278527232673580674962404150811920166329017986523773869741046623932637623007",
    "91015297301419782476103015366958792837873764932552461292791165884073898812814414",
    "13734216313411244157387869586654815260432690648124113456009109679560754748674606",
    "03227178345493003537936562738785424059258957843824000283746031832671165203996676",
    "22873636417533621785188753096887486165751218947390793886174932206305484313257628",
    "69573492644980942888408546440248550479878258534566522557901812784307361978851340",
    "52726705582840739837599854512877428929994842705216265832527564456954892689870270",
    "78838378407733148367649564107237496006094048593708959670063677802988307113944522",
    "31032661612573127657262852108857453796429669725786676502684858846912151599567472",
    "38690675350402536892325764048936856136184630959679068418534474140473130216761082",
    "05138971649482561844148237707440562831931089544088821151806962538015278155763187",
    "487878945694840272084274212918033049841007502061",
);

static DEFAULT_PARAMS: LazyLock<GroupParams> = LazyLock::new(|| GroupParams {
    prime: BigUint::parse_bytes(DEFAULT_PRIME.as_bytes(), 10)
        .expect("embedded prime is a valid decimal literal"),
    generator: BigUint::from(DEFAULT_GENERATOR),
});

/// Prime modulus and generator of the discrete-log group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParams {
    /// Group modulus `p`
    #[serde(with = "serde_decimal")]
    pub prime: BigUint,
    /// Generator `g`
    #[serde(rename = "gen", with = "serde_decimal")]
    pub generator: BigUint,
}

impl Default for GroupParams {
    fn default() -> Self {
        DEFAULT_PARAMS.clone()
    }
}

impl GroupParams {
    /// Create parameters from a prime and generator.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] if the values fail [`GroupParams::validate`].
    pub fn new(prime: BigUint, generator: BigUint) -> Result<Self> {
        let params = Self { prime, generator };
        params.validate()?;
        Ok(params)
    }

    /// Borrow the process-wide default parameters.
    #[must_use]
    pub fn default_ref() -> &'static GroupParams {
        &DEFAULT_PARAMS
    }

    /// Check `p` is odd and greater than 2, and `1 < g < p`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] describing the first violated bound.
    pub fn validate(&self) -> Result<()> {
        if self.prime <= BigUint::from(2u32) || !self.prime.bit(0) {
            return Err(CryptoError::invalid_argument(
                "prime must be an odd integer greater than 2",
            ));
        }
        if self.generator <= BigUint::one() || self.generator >= self.prime {
            return Err(CryptoError::invalid_argument(
                "generator must lie strictly between 1 and the prime",
            ));
        }
        Ok(())
    }

    /// `g^exponent mod p`, accepting negative exponents.
    ///
    /// # Errors
    ///
    /// Propagates [`math::mod_pow`] failures.
    pub fn pow_generator(&self, exponent: &BigInt) -> Result<BigUint> {
        math::mod_pow(&self.generator, exponent, &self.prime)
    }

    /// Public value for a secret exponent, `g^private mod p`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidArgument`] if the prime is zero.
    pub fn public_for(&self, private: &BigUint) -> Result<BigUint> {
        math::mod_pow_unsigned(&self.generator, private, &self.prime)
    }

    /// Split `p - 1` into its large cofactor and small-factor product.
    ///
    /// # Errors
    ///
    /// See [`decompose`].
    pub fn decompose(&self, bound: Option<u64>) -> Result<(BigUint, BigUint)> {
        decompose(&self.prime, bound)
    }

    /// Generator of the large prime-order subgroup, `g^factors mod p`.
    ///
    /// # Errors
    ///
    /// See [`decompose`].
    pub fn subgroup_generator(&self, bound: Option<u64>) -> Result<BigUint> {
        let (_, factors) = self.decompose(bound)?;
        math::mod_pow_unsigned(&self.generator, &factors, &self.prime)
    }
}

/// Pohlig-Hellman decomposition of `prime - 1`.
///
/// Divides out every integer `2..=bound` as many times as it divides and
/// returns `(cofactor, small_factor_product)` with
/// `cofactor * small_factor_product == prime - 1`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidArgument`] if `bound` is `Some(0)` or the
/// prime is smaller than 3.
pub fn decompose(prime: &BigUint, bound: Option<u64>) -> Result<(BigUint, BigUint)> {
    let bound = match bound {
        Some(0) => {
            return Err(CryptoError::invalid_argument(
                "factor bound must be a positive integer",
            ));
        }
        Some(bound) => bound,
        None => DEFAULT_FACTOR_BOUND,
    };
    if *prime < BigUint::from(3u32) {
        return Err(CryptoError::invalid_argument("prime must be at least 3"));
    }

    let mut cofactor = prime - 1u32;
    let mut factors = BigUint::one();

    for i in 2..=bound {
        while (&cofactor % i).is_zero() {
            cofactor /= i;
            factors *= i;
        }
    }

    tracing::trace!(
        bound,
        cofactor_bits = cofactor.bits(),
        "decomposed group order"
    );

    Ok((cofactor, factors))
}
