//! # DiscreteCrypt
//!
//! Discrete-log identities and the protocols built on them.
//!
//! This crate provides:
//! - Password- or randomly-seeded identities ([`Contact`]) over a fixed
//!   prime-order group, with export/import and password recovery
//! - Diffie-Hellman exchange with a memoizing [`ExchangeCache`]
//! - An authenticated encryption [`Envelope`] keyed from DH values or
//!   passwords ([`Symmetric`])
//! - Deterministic-nonce Schnorr [`Signature`]s
//! - Pohlig-Hellman small-factor decomposition of the group order
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Notes |
//! |----------|-----------|-------|
//! | Group | `Z_p^*`, 3080-bit nearly-safe prime | `p - 1 = 420 * q` |
//! | Key Derivation | scrypt | three cost presets |
//! | Key Exchange | finite-field Diffie-Hellman | cached per pair |
//! | Encryption | AES-256-CTR | session key wrapped under scrypt KEK |
//! | Authentication | HMAC-SHA256 | tag doubles as nonce and salt |
//! | Signatures | Schnorr, SHA-256 challenge | nonce from scrypt |
//!
//! ## Example
//!
//! ```no_run
//! use discrete_crypt::{Contact, Context, CreateOptions};
//!
//! # async fn demo() -> discrete_crypt::Result<()> {
//! let ctx = Context::new();
//! let alice = Contact::create(&ctx, CreateOptions::new().password("alice")).await?;
//! let bob = Contact::create(&ctx, CreateOptions::new()).await?;
//!
//! let envelope = alice.send(&ctx, &bob, "Hello, Bob").await?;
//! let message: String = bob.open(&ctx, &envelope).await?;
//!
//! let signature = alice.sign(&ctx, &message, true).await?;
//! alice.verify(&signature, None)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cache;
pub mod contact;
pub mod context;
pub mod envelope;
pub mod error;
pub mod group;
pub mod kdf;
pub mod math;
pub mod random;
pub mod signature;
pub mod symmetric;
pub mod transport;

pub use cache::ExchangeCache;
pub use contact::{Contact, ContactRecord, CreateOptions, ExportOptions};
pub use context::Context;
pub use envelope::Envelope;
pub use error::{CryptoError, KeyKind, Result};
pub use group::{GroupParams, decompose};
pub use kdf::{Kdf, KdfBackend, KdfConfig, KeyInput, SaltInput};
pub use math::mod_pow;
pub use signature::Signature;
pub use symmetric::Symmetric;

/// Random salt size for new contacts
pub const CONTACT_SALT_SIZE: usize = 16;
