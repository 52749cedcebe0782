//! Biometric-backed secure channel.
//!
//! The host platform (secure enclave, TPM, OS keystore) supplies a
//! KEK-equivalent for wrapping the master key behind a biometric factor.
//! The vault never learns the channel's underlying secret; it only
//! observes whether the channel produced a usable unwrap key.

use std::collections::HashMap;
use std::sync::RwLock;

use finvault_common::{ProfileId, Result};
use finvault_crypto::KeyEncryptionKey;

/// Capability supplied by the platform's biometric-backed key storage.
///
/// `obtain_kek` is expected to gate on the platform's biometric prompt;
/// the same profile must yield the same key across calls for as long as
/// the enrollment is valid.
pub trait BiometricChannel: Send + Sync {
    /// Obtain the wrapping key for a profile, prompting the user as the
    /// platform requires.
    ///
    /// # Errors
    /// - `Authentication` if the platform denied the request
    fn obtain_kek(&self, profile: &ProfileId) -> Result<KeyEncryptionKey>;
}

/// In-memory biometric channel for tests and development.
///
/// Mints one random key per profile on first use and returns it on every
/// subsequent call, mimicking a hardware-backed key that survives for the
/// lifetime of the enrollment. `revoke` simulates the platform resetting
/// its biometric enrollment: the next call mints a fresh key, so existing
/// biometric wrappings stop unwrapping.
pub struct MemoryBiometricChannel {
    keys: RwLock<HashMap<String, KeyEncryptionKey>>,
}

impl MemoryBiometricChannel {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Drop the key for a profile, as a platform enrollment reset would.
    pub fn revoke(&self, profile: &ProfileId) {
        self.keys.write().unwrap().remove(profile.as_str());
    }
}

impl Default for MemoryBiometricChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl BiometricChannel for MemoryBiometricChannel {
    fn obtain_kek(&self, profile: &ProfileId) -> Result<KeyEncryptionKey> {
        let mut keys = self.keys.write().unwrap();
        let kek = keys
            .entry(profile.as_str().to_string())
            .or_insert_with(KeyEncryptionKey::generate);
        Ok(kek.clone())
    }
}
