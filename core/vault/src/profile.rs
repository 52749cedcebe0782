//! Persisted profile record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finvault_common::{Error, ProfileId, Result};
use finvault_crypto::{KdfParams, Salt};

/// Persisted state for one profile.
///
/// Contains everything needed to unlock the profile given the right factor,
/// and nothing that is usable without it: the master key appears only in
/// wrapped (encrypted) form, stored as serialized envelope strings so the
/// opaque local store can treat them as ordinary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Unique profile identifier.
    pub id: ProfileId,
    /// Human-readable profile name (plaintext, searchable).
    pub display_name: String,
    /// Salt for the PIN-derived key-encryption key.
    pub salt: Salt,
    /// KDF parameters this profile's wrapping was created with.
    pub kdf_params: KdfParams,
    /// Master key wrapped under the current PIN (serialized envelope).
    pub wrapped_master_key: String,
    /// Master key wrapped under the biometric channel, if enrolled.
    pub biometric_wrapped_master_key: Option<String>,
    /// Profile creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Serialize to bytes for the opaque store.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from stored bytes.
    ///
    /// A record that cannot be parsed is unusable in exactly the way a
    /// missing one is: the key material it carried is lost, and there is
    /// no repair short of recreating the profile.
    ///
    /// # Errors
    /// - `ProfileNotFound` if the record is corrupt
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|_| Error::ProfileNotFound("Profile record is corrupt".to_string()))
    }
}
