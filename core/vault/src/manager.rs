//! Profile lifecycle manager.
//!
//! Drives the per-profile state machine: create (Uninitialized → Locked,
//! returning an unlocked session), login/logout (Locked ↔ Unlocked), PIN
//! change and biometric enrollment (Unlocked self-loops), and delete
//! (terminal crypto-shred).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::biometric::BiometricChannel;
use crate::profile::ProfileRecord;
use crate::session::Session;
use finvault_common::{Error, ProfileId, Result};
use finvault_crypto::{keystore, BlobEnvelope, KdfParams};
use finvault_storage::ProfileStore;

/// Host-supplied manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// KDF parameters for new profiles and rewraps. Existing profiles keep
    /// the parameters stored in their record until their next rewrap.
    pub kdf_params: KdfParams,
    /// Inactivity timeout for sessions; None disables idle expiry.
    pub idle_timeout: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            kdf_params: KdfParams::interactive(),
            idle_timeout: None,
        }
    }
}

/// Profile lifecycle manager.
///
/// Sessions returned by `create_profile` and `login` are the only path to
/// a live master key; the manager itself holds no key material.
pub struct ProfileManager {
    store: Arc<dyn ProfileStore>,
    config: ManagerConfig,
    /// Serializes PIN change, biometric enrollment, and delete against each
    /// other, so the persisted wrapped-key record never loses an update.
    /// Logins take no lock: record replacement is atomic, so a concurrent
    /// rewrap yields either the old record or the new one, never a mix.
    rewrap_lock: Mutex<()>,
}

impl ProfileManager {
    /// Create a manager with default configuration.
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self::with_config(store, ManagerConfig::default())
    }

    /// Create a manager with host-supplied configuration.
    pub fn with_config(store: Arc<dyn ProfileStore>, config: ManagerConfig) -> Self {
        Self {
            store,
            config,
            rewrap_lock: Mutex::new(()),
        }
    }

    /// Create a new profile and return its first unlocked session.
    ///
    /// # Postconditions
    /// - A fresh master key exists, persisted only in wrapped form
    /// - The profile record is stored under the opaque store
    ///
    /// # Errors
    /// - `InvalidInput` on an empty PIN
    /// - `AlreadyExists` if the profile id is taken
    pub async fn create_profile(
        &self,
        id: ProfileId,
        display_name: impl Into<String>,
        pin: &str,
    ) -> Result<Session> {
        let created = keystore::create(pin, self.config.kdf_params.clone())?;

        let record = ProfileRecord {
            id: id.clone(),
            display_name: display_name.into(),
            salt: created.salt,
            kdf_params: created.kdf_params,
            wrapped_master_key: created.wrapped_master_key.serialize(),
            biometric_wrapped_master_key: None,
            created_at: chrono::Utc::now(),
        };

        self.store.insert(&id, record.to_bytes()?).await?;

        info!(profile = %id, "Profile created");
        Ok(Session::unlocked(
            id,
            created.master_key,
            self.config.idle_timeout,
        ))
    }

    /// Unlock a profile with its PIN.
    ///
    /// # Errors
    /// - `ProfileNotFound` if the profile does not exist or its record is corrupt
    /// - `Authentication` on a wrong PIN (the profile stays locked)
    pub async fn login(&self, id: &ProfileId, pin: &str) -> Result<Session> {
        let record = self.load_record(id).await?;
        let wrapped = Self::parse_wrapped(&record.wrapped_master_key)?;

        // Argon2 is CPU-bound and can take a second at interactive
        // parameters; run it off the async executor.
        let pin = pin.to_string();
        let master_key = tokio::task::spawn_blocking(move || {
            keystore::unlock(&pin, &record.salt, &record.kdf_params, &wrapped)
        })
        .await
        .map_err(|e| Error::Storage(format!("Unlock task failed: {}", e)))??;

        debug!(profile = %id, "Profile unlocked with PIN");
        Ok(Session::unlocked(
            id.clone(),
            master_key,
            self.config.idle_timeout,
        ))
    }

    /// Unlock a profile through the biometric channel.
    ///
    /// # Errors
    /// - `ProfileNotFound` if the profile does not exist
    /// - `KeyNotFound` if no biometric wrapping is enrolled
    /// - `Authentication` if the channel key no longer unwraps the master key
    pub async fn login_biometric(
        &self,
        id: &ProfileId,
        channel: &dyn BiometricChannel,
    ) -> Result<Session> {
        let record = self.load_record(id).await?;
        let serialized = record.biometric_wrapped_master_key.as_deref().ok_or_else(|| {
            Error::KeyNotFound(format!("No biometric enrollment for profile: {}", id))
        })?;
        let wrapped = Self::parse_wrapped(serialized)?;

        let kek = channel.obtain_kek(id)?;
        let master_key = keystore::unwrap_for_biometric(&kek, &wrapped)?;

        debug!(profile = %id, "Profile unlocked with biometric factor");
        Ok(Session::unlocked(
            id.clone(),
            master_key,
            self.config.idle_timeout,
        ))
    }

    /// Lock a session, dropping its master key from memory.
    ///
    /// Persisted wrapped copies are unaffected; the profile can be
    /// unlocked again with either factor.
    pub fn logout(&self, session: &mut Session) {
        session.lock();
        debug!(profile = %session.profile_id(), "Session locked");
    }

    /// Change the profile's PIN.
    ///
    /// Validates the old PIN, rewraps the same master key under the new
    /// PIN, and atomically replaces the persisted salt, parameters, and
    /// wrapped key. Document envelopes are untouched, so this is O(1) in
    /// vault size. Serialized against concurrent rewraps.
    ///
    /// # Errors
    /// - `KeyNotFound` if the session is locked
    /// - `Authentication` if the old PIN is wrong
    /// - `InvalidInput` if the new PIN is empty
    pub async fn change_pin(
        &self,
        session: &Session,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<()> {
        session.master_key()?;

        let _guard = self.rewrap_lock.lock().await;

        let mut record = self.load_record(session.profile_id()).await?;
        let wrapped = Self::parse_wrapped(&record.wrapped_master_key)?;

        // Revalidate the old PIN against the persisted wrapping rather
        // than trusting the session alone.
        let master_key = keystore::unlock(old_pin, &record.salt, &record.kdf_params, &wrapped)?;

        let rewrapped = keystore::rewrap(&master_key, new_pin, self.config.kdf_params.clone())?;

        record.salt = rewrapped.salt;
        record.kdf_params = rewrapped.kdf_params;
        record.wrapped_master_key = rewrapped.wrapped_master_key.serialize();
        // The biometric wrapping is keyed independently and survives.

        self.store
            .replace(session.profile_id(), record.to_bytes()?)
            .await?;

        info!(profile = %session.profile_id(), "PIN changed");
        Ok(())
    }

    /// Enroll the biometric factor for an unlocked session.
    ///
    /// Wraps the session's master key under the channel-supplied KEK and
    /// atomically updates the persisted record; either factor alone can
    /// unlock the profile afterwards.
    ///
    /// # Errors
    /// - `KeyNotFound` if the session is locked
    pub async fn enroll_biometric(
        &self,
        session: &Session,
        channel: &dyn BiometricChannel,
    ) -> Result<()> {
        let master_key = session.master_key()?;

        let _guard = self.rewrap_lock.lock().await;

        let kek = channel.obtain_kek(session.profile_id())?;
        let wrapped = keystore::wrap_for_biometric(master_key, &kek)?;

        let mut record = self.load_record(session.profile_id()).await?;
        record.biometric_wrapped_master_key = Some(wrapped.serialize());

        self.store
            .replace(session.profile_id(), record.to_bytes()?)
            .await?;

        info!(profile = %session.profile_id(), "Biometric factor enrolled");
        Ok(())
    }

    /// Delete a profile: the crypto-shred primitive.
    ///
    /// Discards the wrapped master key, salt, and KDF parameters. Every
    /// envelope encrypted under this profile's master key becomes
    /// permanently unrecoverable without the store having to overwrite a
    /// single ciphertext byte. Irreversible by design.
    ///
    /// # Errors
    /// - `ProfileNotFound` if the profile does not exist
    pub async fn delete_profile(&self, id: &ProfileId) -> Result<()> {
        let _guard = self.rewrap_lock.lock().await;

        self.store.delete(id).await?;
        info!(profile = %id, "Profile deleted (crypto-shred)");
        Ok(())
    }

    /// Check whether a profile exists.
    pub async fn profile_exists(&self, id: &ProfileId) -> Result<bool> {
        self.store.exists(id).await
    }

    /// Load the plaintext metadata of a profile record.
    pub async fn profile_record(&self, id: &ProfileId) -> Result<ProfileRecord> {
        self.load_record(id).await
    }

    /// List the ids of all stored profiles.
    pub async fn list_profiles(&self) -> Result<Vec<ProfileId>> {
        self.store.list().await
    }

    async fn load_record(&self, id: &ProfileId) -> Result<ProfileRecord> {
        let bytes = self.store.load(id).await?;
        ProfileRecord::from_bytes(&bytes)
    }

    /// A wrapped-key envelope that no longer parses means the record lost
    /// key material; that is profile corruption, not a caller-facing
    /// envelope error.
    fn parse_wrapped(serialized: &str) -> Result<BlobEnvelope> {
        BlobEnvelope::deserialize(serialized)
            .map_err(|_| Error::ProfileNotFound("Profile record is corrupt".to_string()))
    }
}
