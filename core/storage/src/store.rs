//! Profile store trait definition.

use async_trait::async_trait;

use finvault_common::{ProfileId, Result};

/// Opaque store for persisted profile records.
///
/// The store holds each record as an opaque byte blob keyed by profile id;
/// it has no knowledge of envelopes, salts, or any vault internals. All
/// operations are async.
///
/// # Atomicity
/// `replace` must swap the full record in one step: a reader never observes
/// a half-written record, and on failure the previous record survives
/// intact. This is what makes PIN change safe against crashes.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get the store name (e.g., "memory", "local").
    fn name(&self) -> &str;

    /// Insert a new profile record.
    ///
    /// # Errors
    /// - `AlreadyExists` if a record with this id is present
    async fn insert(&self, id: &ProfileId, record: Vec<u8>) -> Result<()>;

    /// Atomically replace an existing profile record.
    ///
    /// # Errors
    /// - `ProfileNotFound` if no record with this id exists
    async fn replace(&self, id: &ProfileId, record: Vec<u8>) -> Result<()>;

    /// Load a profile record.
    ///
    /// # Errors
    /// - `ProfileNotFound` if no record with this id exists
    async fn load(&self, id: &ProfileId) -> Result<Vec<u8>>;

    /// Delete a profile record.
    ///
    /// This is the crypto-shred primitive: removing the record discards the
    /// wrapped master key and salt, rendering every envelope encrypted
    /// under that profile's master key permanently unrecoverable.
    ///
    /// # Errors
    /// - `ProfileNotFound` if no record with this id exists
    async fn delete(&self, id: &ProfileId) -> Result<()>;

    /// Check whether a profile record exists.
    async fn exists(&self, id: &ProfileId) -> Result<bool>;

    /// List the ids of all stored profiles.
    async fn list(&self) -> Result<Vec<ProfileId>>;
}
