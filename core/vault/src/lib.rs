//! Profile vault engine for FinVault.
//!
//! This module provides:
//! - Profile lifecycle management (create, unlock, PIN change, delete)
//! - Session handling with secure key ownership
//! - Biometric factor enrollment through a platform-supplied channel
//! - Persisted profile records for the opaque local store
//!
//! # Architecture
//! The vault module sits between calling feature code and the profile
//! store. Feature code uses the four-call crypto contract (`encrypt`,
//! `decrypt`, envelope `serialize`/`deserialize`) with a master key
//! borrowed from an unlocked [`Session`]. Everything else (salts, KDF
//! parameters, wrapped keys) stays behind the manager.

pub mod biometric;
pub mod manager;
pub mod profile;
pub mod session;

pub use biometric::{BiometricChannel, MemoryBiometricChannel};
pub use manager::{ManagerConfig, ProfileManager};
pub use profile::ProfileRecord;
pub use session::{Session, SessionHandle, SessionState};
