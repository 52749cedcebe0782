//! Cryptographic primitives for FinVault.
//!
//! This module provides:
//! - Key derivation using Argon2id
//! - Authenticated blob encryption using XChaCha20-Poly1305
//! - Master key wrapping, unwrapping, and rewrapping
//! - The versioned envelope format used to persist ciphertext
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext, PIN, or key material is ever logged
//! - Decryption fails closed: tampering never yields partial plaintext
//!
//! The four-call contract feature code is allowed to use is `encrypt`,
//! `decrypt`, `BlobEnvelope::serialize`, and `BlobEnvelope::deserialize`;
//! salts, KDF parameters, and wrapped-key bytes stay behind the vault.

pub mod aead;
pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod keystore;

pub use aead::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use envelope::{AlgorithmId, BlobEnvelope, FORMAT_VERSION};
pub use kdf::{derive_kek, KdfAlgorithm, KdfParams};
pub use keys::{KeyEncryptionKey, MasterKey, Salt, KEY_LENGTH, SALT_LENGTH};
pub use keystore::{CreatedProfileKeys, RewrappedKeys};
