//! Master key wrapping and unwrapping.
//!
//! Each profile has exactly one master key, generated at creation and
//! persisted only in wrapped form: encrypted under a key-encryption key
//! derived from the PIN (or supplied by the biometric channel). Changing
//! the PIN rewraps the same master key and never touches document
//! envelopes, so a PIN change is O(1) in vault size.
//!
//! The functions here are pure key operations; persistence and the profile
//! state machine live in `finvault-vault`.

use crate::aead;
use crate::envelope::BlobEnvelope;
use crate::kdf::{derive_kek, KdfParams};
use crate::keys::{KeyEncryptionKey, MasterKey, Salt, KEY_LENGTH};
use finvault_common::{Error, Result};

/// Domain separation for PIN-wrapped master keys.
///
/// Bound as AAD so a document envelope (or a biometric wrapping) can never
/// be substituted for a PIN-wrapped key without detection.
const PIN_WRAP_AAD: &[u8] = b"finvault/wrapped-master-key/pin/v1";

/// Domain separation for biometric-wrapped master keys.
const BIOMETRIC_WRAP_AAD: &[u8] = b"finvault/wrapped-master-key/biometric/v1";

/// Output of profile key creation.
pub struct CreatedProfileKeys {
    /// Fresh random salt for the PIN-derived KEK.
    pub salt: Salt,
    /// KDF parameters the wrapping was created with.
    pub kdf_params: KdfParams,
    /// Master key encrypted under the PIN-derived KEK.
    pub wrapped_master_key: BlobEnvelope,
    /// Live master key for the new session.
    pub master_key: MasterKey,
}

/// Output of a PIN rewrap.
pub struct RewrappedKeys {
    pub salt: Salt,
    pub kdf_params: KdfParams,
    pub wrapped_master_key: BlobEnvelope,
}

/// Generate a fresh master key and wrap it under a new PIN.
///
/// # Errors
/// - `InvalidInput` if the PIN is empty
pub fn create(pin: &str, kdf_params: KdfParams) -> Result<CreatedProfileKeys> {
    let salt = Salt::generate();
    let master_key = MasterKey::generate();

    let kek = derive_kek(pin, &salt, &kdf_params)?;
    let wrapped_master_key = wrap(&master_key, &kek, PIN_WRAP_AAD)?;

    Ok(CreatedProfileKeys {
        salt,
        kdf_params,
        wrapped_master_key,
        master_key,
    })
}

/// Unwrap a master key with a PIN.
///
/// A wrong PIN and a corrupted wrapped envelope are indistinguishable: both
/// surface as `Authentication`, so the error channel leaks nothing about
/// why unwrapping failed.
///
/// # Errors
/// - `InvalidInput` if the PIN is empty
/// - `Authentication` if the PIN is wrong or the envelope is corrupt
pub fn unlock(
    pin: &str,
    salt: &Salt,
    kdf_params: &KdfParams,
    wrapped: &BlobEnvelope,
) -> Result<MasterKey> {
    let kek = derive_kek(pin, salt, kdf_params)?;
    unwrap(&kek, wrapped)
}

/// Rewrap an already unlocked master key under a new PIN.
///
/// Generates a fresh salt, derives a new KEK, and re-encrypts the same
/// master key. Previously encrypted blobs are untouched.
pub fn rewrap(
    master_key: &MasterKey,
    new_pin: &str,
    kdf_params: KdfParams,
) -> Result<RewrappedKeys> {
    let salt = Salt::generate();
    let kek = derive_kek(new_pin, &salt, &kdf_params)?;
    let wrapped_master_key = wrap(master_key, &kek, PIN_WRAP_AAD)?;

    Ok(RewrappedKeys {
        salt,
        kdf_params,
        wrapped_master_key,
    })
}

/// Wrap the master key under a biometric-channel KEK.
///
/// Produces a second, independent wrapped copy of the same master key so
/// either factor alone can unlock it.
pub fn wrap_for_biometric(
    master_key: &MasterKey,
    kek: &KeyEncryptionKey,
) -> Result<BlobEnvelope> {
    wrap(master_key, kek, BIOMETRIC_WRAP_AAD)
}

/// Unwrap a biometric-wrapped master key.
///
/// # Errors
/// - `Authentication` if the channel KEK does not match or the envelope is corrupt
pub fn unwrap_for_biometric(
    kek: &KeyEncryptionKey,
    wrapped: &BlobEnvelope,
) -> Result<MasterKey> {
    unwrap(kek, wrapped)
}

fn wrap(master_key: &MasterKey, kek: &KeyEncryptionKey, domain: &[u8]) -> Result<BlobEnvelope> {
    aead::seal(kek.as_bytes(), master_key.as_bytes(), Some(domain))
}

fn unwrap(kek: &KeyEncryptionKey, wrapped: &BlobEnvelope) -> Result<MasterKey> {
    let plaintext = aead::open(kek.as_bytes(), wrapped)
        .map_err(|_| Error::Authentication("Failed to unwrap master key".to_string()))?;

    if plaintext.len() != KEY_LENGTH {
        return Err(Error::Authentication(
            "Failed to unwrap master key".to_string(),
        ));
    }

    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&plaintext);
    Ok(MasterKey::from_bytes(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::KdfAlgorithm;

    fn test_params() -> KdfParams {
        KdfParams {
            algorithm: KdfAlgorithm::Argon2id,
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_create_and_unlock() {
        let created = create("1234", test_params()).unwrap();

        let unlocked = unlock(
            "1234",
            &created.salt,
            &created.kdf_params,
            &created.wrapped_master_key,
        )
        .unwrap();

        assert_eq!(unlocked.as_bytes(), created.master_key.as_bytes());
    }

    #[test]
    fn test_wrong_pin_fails_authentication() {
        let created = create("1234", test_params()).unwrap();

        let result = unlock(
            "0000",
            &created.salt,
            &created.kdf_params,
            &created.wrapped_master_key,
        );

        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_corrupt_wrapped_key_is_indistinguishable_from_wrong_pin() {
        let created = create("1234", test_params()).unwrap();
        let mut wrapped = created.wrapped_master_key.clone();
        wrapped.ciphertext[0] ^= 0x01;

        let result = unlock("1234", &created.salt, &created.kdf_params, &wrapped);

        // Same variant as the wrong-PIN case: no oracle.
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_empty_pin_fails_invalid_input() {
        let result = create("", test_params());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rewrap_same_master_key_new_pin() {
        let created = create("1234", test_params()).unwrap();
        let rewrapped = rewrap(&created.master_key, "5678", test_params()).unwrap();

        assert_ne!(rewrapped.salt, created.salt);

        let unlocked = unlock(
            "5678",
            &rewrapped.salt,
            &rewrapped.kdf_params,
            &rewrapped.wrapped_master_key,
        )
        .unwrap();
        assert_eq!(unlocked.as_bytes(), created.master_key.as_bytes());

        // Old PIN no longer unlocks the new wrapping.
        let result = unlock(
            "1234",
            &rewrapped.salt,
            &rewrapped.kdf_params,
            &rewrapped.wrapped_master_key,
        );
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_biometric_wrap_unwrap() {
        let created = create("1234", test_params()).unwrap();
        let channel_kek = KeyEncryptionKey::generate();

        let wrapped = wrap_for_biometric(&created.master_key, &channel_kek).unwrap();
        let unlocked = unwrap_for_biometric(&channel_kek, &wrapped).unwrap();

        assert_eq!(unlocked.as_bytes(), created.master_key.as_bytes());
    }

    #[test]
    fn test_biometric_wrapping_rejects_foreign_kek() {
        let created = create("1234", test_params()).unwrap();
        let wrapped = wrap_for_biometric(&created.master_key, &KeyEncryptionKey::generate()).unwrap();

        let result = unwrap_for_biometric(&KeyEncryptionKey::generate(), &wrapped);
        assert!(matches!(result, Err(Error::Authentication(_))));
    }

    #[test]
    fn test_pin_and_biometric_wrappings_not_interchangeable() {
        // Domain-separation AAD keeps the two wrapped copies distinct even
        // under the same KEK bytes.
        let created = create("1234", test_params()).unwrap();
        let kek = derive_kek("1234", &created.salt, &created.kdf_params).unwrap();

        let result = unwrap_for_biometric(&kek, &created.wrapped_master_key);
        assert!(matches!(result, Err(Error::Authentication(_))));
    }
}
