//! Self-describing envelope for encrypted blobs.
//!
//! An envelope carries everything needed to decrypt a blob except the key:
//! format version, algorithm identifier, nonce, ciphertext, authentication
//! tag, and optional associated data. The serialized form is a versioned
//! binary layout (big-endian lengths, version byte first) encoded as
//! base64, so the opaque local store can persist it as an ordinary string
//! field.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::aead::{NONCE_SIZE, TAG_SIZE};
use finvault_common::{Error, Result};

/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// AEAD algorithm identifier carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmId {
    XChaCha20Poly1305,
}

impl AlgorithmId {
    fn to_byte(self) -> u8 {
        match self {
            AlgorithmId::XChaCha20Poly1305 => 1,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(AlgorithmId::XChaCha20Poly1305),
            other => Err(Error::UnsupportedFormat(format!(
                "Unknown algorithm id: {}",
                other
            ))),
        }
    }
}

/// Encrypted blob with its decryption context.
///
/// The authentication tag covers `ciphertext` and `aad` together; tampering
/// with any field makes decryption fail closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEnvelope {
    /// Envelope format version, checked before any decoding.
    pub format_version: u8,
    /// AEAD algorithm that produced the ciphertext.
    pub algorithm: AlgorithmId,
    /// Random nonce, unique per (key, envelope).
    pub nonce: [u8; NONCE_SIZE],
    /// Encrypted payload without the tag.
    pub ciphertext: Vec<u8>,
    /// Poly1305 authentication tag over ciphertext and aad.
    pub auth_tag: [u8; TAG_SIZE],
    /// Associated data bound into the tag but stored in the clear.
    pub aad: Option<Vec<u8>>,
}

impl BlobEnvelope {
    /// Serialize to the storable string form.
    ///
    /// The encoding is deterministic and platform-stable: version byte
    /// first, then algorithm, nonce, length-prefixed ciphertext (u32
    /// big-endian), tag, and an aad presence flag followed by the
    /// length-prefixed aad when present.
    pub fn serialize(&self) -> String {
        let aad_len = self.aad.as_ref().map(|a| a.len() + 4).unwrap_or(0);
        let mut buf =
            Vec::with_capacity(2 + NONCE_SIZE + 4 + self.ciphertext.len() + TAG_SIZE + 1 + aad_len);

        buf.push(self.format_version);
        buf.push(self.algorithm.to_byte());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&(self.ciphertext.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.ciphertext);
        buf.extend_from_slice(&self.auth_tag);
        match &self.aad {
            Some(aad) => {
                buf.push(1);
                buf.extend_from_slice(&(aad.len() as u32).to_be_bytes());
                buf.extend_from_slice(aad);
            }
            None => buf.push(0),
        }

        URL_SAFE_NO_PAD.encode(buf)
    }

    /// Deserialize from the storable string form.
    ///
    /// The version byte is checked before anything else: an unknown version
    /// fails with `UnsupportedFormat` rather than best-effort decoding.
    /// Truncated or otherwise invalid input fails with `MalformedEnvelope`;
    /// a partially constructed envelope is never returned.
    ///
    /// # Errors
    /// - `MalformedEnvelope` on bad base64, truncation, or trailing bytes
    /// - `UnsupportedFormat` on unknown version or algorithm
    pub fn deserialize(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| Error::MalformedEnvelope(format!("Invalid base64: {}", e)))?;

        let mut reader = Reader::new(&bytes);

        let format_version = reader.read_u8()?;
        if format_version != FORMAT_VERSION {
            return Err(Error::UnsupportedFormat(format!(
                "Unknown envelope version: {}",
                format_version
            )));
        }

        let algorithm = AlgorithmId::from_byte(reader.read_u8()?)?;

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(reader.read_exact(NONCE_SIZE)?);

        let ciphertext_len = reader.read_u32()? as usize;
        let ciphertext = reader.read_exact(ciphertext_len)?.to_vec();

        let mut auth_tag = [0u8; TAG_SIZE];
        auth_tag.copy_from_slice(reader.read_exact(TAG_SIZE)?);

        let aad = match reader.read_u8()? {
            0 => None,
            1 => {
                let aad_len = reader.read_u32()? as usize;
                Some(reader.read_exact(aad_len)?.to_vec())
            }
            other => {
                return Err(Error::MalformedEnvelope(format!(
                    "Invalid aad flag: {}",
                    other
                )))
            }
        };

        reader.finish()?;

        Ok(Self {
            format_version,
            algorithm,
            nonce,
            ciphertext,
            auth_tag,
            aad,
        })
    }
}

/// Bounds-checked cursor over the decoded envelope bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| Error::MalformedEnvelope("Envelope truncated".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_exact(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(Error::MalformedEnvelope(
                "Trailing bytes after envelope".to_string(),
            ));
        }
        Ok(())
    }
}
