//! Key derivation using Argon2id.
//!
//! Argon2id is a memory-hard password hashing function that makes
//! brute-forcing a short PIN expensive per candidate, providing resistance
//! to both GPU and time-memory trade-off attacks.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::keys::{KeyEncryptionKey, Salt, KEY_LENGTH};
use finvault_common::{Error, Result};

/// KDF algorithm identifier, stored per profile.
///
/// Profiles created with an older algorithm keep working after new
/// algorithms are added. An identifier this build does not know still
/// parses (as `Unknown`, preserving the stored name) so the record itself
/// stays readable; deriving a key from it fails explicitly instead of
/// being guessed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfAlgorithm {
    Argon2id,
    /// Identifier written by a newer build. Round-trips unchanged.
    Unknown(String),
}

impl KdfAlgorithm {
    /// Stable identifier used in serialized records.
    pub fn name(&self) -> &str {
        match self {
            KdfAlgorithm::Argon2id => "Argon2id",
            KdfAlgorithm::Unknown(name) => name,
        }
    }
}

impl Serialize for KdfAlgorithm {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for KdfAlgorithm {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(match name.as_str() {
            "Argon2id" => KdfAlgorithm::Argon2id,
            _ => KdfAlgorithm::Unknown(name),
        })
    }
}

/// Parameters for key derivation.
///
/// Stored alongside each profile so parameters can be raised for new
/// profiles without breaking existing ones. A profile's stored parameters
/// are never rewritten automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Which KDF produced the key-encryption key.
    pub algorithm: KdfAlgorithm,
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Create parameters suitable for interactive use.
    ///
    /// These parameters provide a balance between security and usability,
    /// targeting approximately 0.5-1 second of derivation time.
    pub fn interactive() -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Create parameters suitable for sensitive data.
    ///
    /// Higher security parameters that may take several seconds.
    pub fn sensitive() -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            memory_cost: 262144, // 256 MiB
            time_cost: 4,
            parallelism: 4,
        }
    }

    /// Create moderate parameters for mobile devices.
    pub fn moderate() -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            memory_cost: 32768, // 32 MiB
            time_cost: 3,
            parallelism: 2,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Derive a key-encryption key from a PIN and salt.
///
/// # Preconditions
/// - `pin` must not be empty
/// - `params` must have valid parameters for its algorithm
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
///
/// # Errors
/// - `InvalidInput` if the PIN is empty
/// - `UnsupportedFormat` if the algorithm is not known to this build
///
/// # Security
/// - The PIN is not stored or logged
/// - The derived key zeroizes on drop
pub fn derive_kek(pin: &str, salt: &Salt, params: &KdfParams) -> Result<KeyEncryptionKey> {
    if pin.is_empty() {
        return Err(Error::InvalidInput("PIN cannot be empty".to_string()));
    }

    match &params.algorithm {
        KdfAlgorithm::Argon2id => derive_argon2id(pin.as_bytes(), salt, params),
        KdfAlgorithm::Unknown(name) => Err(Error::UnsupportedFormat(format!(
            "Unknown KDF algorithm: {}",
            name
        ))),
    }
}

fn derive_argon2id(pin: &[u8], salt: &Salt, params: &KdfParams) -> Result<KeyEncryptionKey> {
    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| Error::InvalidInput(format!("Invalid KDF parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_LENGTH];
    argon2
        .hash_password_into(pin, salt.as_bytes(), &mut key_bytes)
        .map_err(|e| Error::InvalidInput(format!("Key derivation failed: {}", e)))?;

    Ok(KeyEncryptionKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters so the test suite is not dominated by Argon2.
    fn test_params() -> KdfParams {
        KdfParams {
            algorithm: KdfAlgorithm::Argon2id,
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_derive_kek_deterministic() {
        let salt = Salt::from_bytes([42u8; 32]);
        let params = test_params();

        let key1 = derive_kek("1234", &salt, &params).unwrap();
        let key2 = derive_kek("1234", &salt, &params).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_kek_different_salt() {
        let salt1 = Salt::from_bytes([1u8; 32]);
        let salt2 = Salt::from_bytes([2u8; 32]);
        let params = test_params();

        let key1 = derive_kek("1234", &salt1, &params).unwrap();
        let key2 = derive_kek("1234", &salt2, &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_kek_different_pin() {
        let salt = Salt::from_bytes([42u8; 32]);
        let params = test_params();

        let key1 = derive_kek("1234", &salt, &params).unwrap();
        let key2 = derive_kek("5678", &salt, &params).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_kek_empty_pin_fails() {
        let salt = Salt::generate();
        let params = test_params();

        let err = derive_kek("", &salt, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_params_roundtrip_through_json() {
        let params = KdfParams::interactive();
        let json = serde_json::to_string(&params).unwrap();
        let restored: KdfParams = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, params);
    }

    #[test]
    fn test_unknown_algorithm_parses_and_fails_unsupported() {
        let json = r#"{"algorithm":"Scrypt","memory_cost":1024,"time_cost":1,"parallelism":1}"#;
        let params: KdfParams = serde_json::from_str(json).unwrap();
        assert_eq!(
            params.algorithm,
            KdfAlgorithm::Unknown("Scrypt".to_string())
        );

        let err = derive_kek("1234", &Salt::generate(), &params).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unknown_algorithm_name_roundtrips_unchanged() {
        let params = KdfParams {
            algorithm: KdfAlgorithm::Unknown("Scrypt".to_string()),
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        };

        let json = serde_json::to_string(&params).unwrap();
        let restored: KdfParams = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, params);
    }
}
