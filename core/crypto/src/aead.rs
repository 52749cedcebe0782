//! Authenticated blob encryption using XChaCha20-Poly1305.
//!
//! XChaCha20-Poly1305 provides both confidentiality and authenticity, with
//! a 24-byte nonce that is safe to generate randomly per call: there is no
//! shared nonce counter, so concurrent encrypts under the same key need no
//! coordination.

use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    XChaCha20Poly1305, XNonce,
};

use crate::envelope::{AlgorithmId, BlobEnvelope, FORMAT_VERSION};
use crate::keys::{MasterKey, KEY_LENGTH};
use finvault_common::{Error, Result};

/// Nonce size for XChaCha20-Poly1305 (24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (16 bytes).
pub const TAG_SIZE: usize = 16;

/// Encrypt a blob under the master key.
///
/// # Postconditions
/// - A fresh random nonce is generated for every call
/// - The tag authenticates ciphertext and aad together
/// - Zero-length plaintext is valid
///
/// # Errors
/// - `Integrity` if the cipher itself fails (should not happen for valid keys)
///
/// # Security
/// - No storage side effects; the envelope exists only in memory
/// - Plaintext and aad are never logged
pub fn encrypt(key: &MasterKey, plaintext: &[u8], aad: Option<&[u8]>) -> Result<BlobEnvelope> {
    seal(key.as_bytes(), plaintext, aad)
}

/// Decrypt a blob envelope under the master key.
///
/// The format version and algorithm are checked before any cryptographic
/// work; an envelope from a future format fails explicitly instead of
/// being decoded best-effort.
///
/// # Postconditions
/// - On success, returns plaintext byte-for-byte equal to what was encrypted
///
/// # Errors
/// - `UnsupportedFormat` on an unknown envelope version
/// - `Integrity` on tag mismatch; no partial plaintext is released
pub fn decrypt(key: &MasterKey, envelope: &BlobEnvelope) -> Result<Vec<u8>> {
    open(key.as_bytes(), envelope)
}

/// AEAD core shared by the blob cipher and the master-key wrapping path.
pub(crate) fn seal(
    key: &[u8; KEY_LENGTH],
    plaintext: &[u8],
    aad: Option<&[u8]>,
) -> Result<BlobEnvelope> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let payload = Payload {
        msg: plaintext,
        aad: aad.unwrap_or(&[]),
    };

    // The aead crate appends the tag to the ciphertext; the envelope keeps
    // them as separate fields.
    let mut ciphertext = cipher
        .encrypt(&nonce, payload)
        .map_err(|_| Error::Integrity("Encryption failed".to_string()))?;

    let tag_start = ciphertext.len() - TAG_SIZE;
    let mut auth_tag = [0u8; TAG_SIZE];
    auth_tag.copy_from_slice(&ciphertext[tag_start..]);
    ciphertext.truncate(tag_start);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(&nonce);

    Ok(BlobEnvelope {
        format_version: FORMAT_VERSION,
        algorithm: AlgorithmId::XChaCha20Poly1305,
        nonce: nonce_bytes,
        ciphertext,
        auth_tag,
        aad: aad.map(|a| a.to_vec()),
    })
}

pub(crate) fn open(key: &[u8; KEY_LENGTH], envelope: &BlobEnvelope) -> Result<Vec<u8>> {
    if envelope.format_version != FORMAT_VERSION {
        return Err(Error::UnsupportedFormat(format!(
            "Unknown envelope version: {}",
            envelope.format_version
        )));
    }

    match envelope.algorithm {
        AlgorithmId::XChaCha20Poly1305 => {}
    }

    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XNonce::from_slice(&envelope.nonce);

    let mut combined = Vec::with_capacity(envelope.ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(&envelope.ciphertext);
    combined.extend_from_slice(&envelope.auth_tag);

    let payload = Payload {
        msg: &combined,
        aad: envelope.aad.as_deref().unwrap_or(&[]),
    };

    cipher
        .decrypt(nonce, payload)
        .map_err(|_| Error::Integrity("Authentication tag mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> MasterKey {
        MasterKey::from_bytes([42u8; KEY_LENGTH])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = b"account statement, March";

        let envelope = encrypt(&key, plaintext, None).unwrap();
        let decrypted = decrypt(&key, &envelope).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let key = test_key();

        let envelope = encrypt(&key, b"", None).unwrap();
        assert!(envelope.ciphertext.is_empty());

        let decrypted = decrypt(&key, &envelope).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_aad_roundtrip() {
        let key = test_key();
        let plaintext = b"scan of passport";
        let aad = b"document/identity";

        let envelope = encrypt(&key, plaintext, Some(aad)).unwrap();
        assert_eq!(envelope.aad.as_deref(), Some(aad.as_slice()));

        let decrypted = decrypt(&key, &envelope).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_nonce_unique_per_call() {
        let key = test_key();
        let plaintext = b"same plaintext";

        let env1 = encrypt(&key, plaintext, None).unwrap();
        let env2 = encrypt(&key, plaintext, None).unwrap();

        assert_ne!(env1.nonce, env2.nonce);
        assert_ne!(env1.ciphertext, env2.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails_integrity() {
        let envelope = encrypt(&test_key(), b"secret", None).unwrap();
        let other = MasterKey::from_bytes([43u8; KEY_LENGTH]);

        let result = decrypt(&other, &envelope);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails_integrity() {
        let key = test_key();
        let mut envelope = encrypt(&key, b"important data", None).unwrap();
        envelope.ciphertext[3] ^= 0x01;

        let result = decrypt(&key, &envelope);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_tampered_tag_fails_integrity() {
        let key = test_key();
        let mut envelope = encrypt(&key, b"important data", None).unwrap();
        envelope.auth_tag[0] ^= 0x01;

        let result = decrypt(&key, &envelope);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_tampered_aad_fails_integrity() {
        let key = test_key();
        let mut envelope = encrypt(&key, b"receipt", Some(b"document/receipt")).unwrap();
        envelope.aad.as_mut().unwrap()[0] ^= 0x01;

        let result = decrypt(&key, &envelope);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_stripped_aad_fails_integrity() {
        let key = test_key();
        let mut envelope = encrypt(&key, b"receipt", Some(b"document/receipt")).unwrap();
        envelope.aad = None;

        let result = decrypt(&key, &envelope);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_single_bit_flips_after_serialization() {
        let key = test_key();
        let envelope = encrypt(&key, b"tax return 2025", Some(b"document/pdf")).unwrap();
        let restored = crate::BlobEnvelope::deserialize(&envelope.serialize()).unwrap();

        for (label, mutate) in [
            ("ciphertext", 0usize),
            ("auth_tag", 1usize),
            ("aad", 2usize),
        ] {
            let mut tampered = restored.clone();
            match mutate {
                0 => tampered.ciphertext[0] ^= 0x01,
                1 => tampered.auth_tag[0] ^= 0x01,
                _ => tampered.aad.as_mut().unwrap()[0] ^= 0x01,
            }
            let result = decrypt(&key, &tampered);
            assert!(
                matches!(result, Err(Error::Integrity(_))),
                "flip in {} must fail closed",
                label
            );
        }
    }

    #[test]
    fn test_future_version_fails_unsupported() {
        let key = test_key();
        let mut envelope = encrypt(&key, b"data", None).unwrap();
        envelope.format_version = 2;

        let result = decrypt(&key, &envelope);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_large_plaintext() {
        let key = test_key();
        let plaintext = vec![0xABu8; 1_000_000]; // 1 MB

        let envelope = encrypt(&key, &plaintext, None).unwrap();
        let decrypted = decrypt(&key, &envelope).unwrap();

        assert_eq!(decrypted, plaintext);
    }
}
