//! Authenticated symmetric encryption.
//!
//! Two entry points:
//! - [`encrypt`]/[`decrypt`] use ChaCha20-Poly1305 with a random nonce
//!   bundled into [`EncryptedData`]. Used for key wrapping.
//! - [`seal_payload`]/[`open_payload`] take an explicit algorithm, nonce and
//!   associated data. Used for bulk payloads whose nonce travels in a header.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{fill_random, DerivedKey};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce, XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};

/// ChaCha20-Poly1305 nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// XChaCha20-Poly1305 nonce size in bytes.
pub const XNONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Ciphertext with the nonce it was produced under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext followed by the Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData { nonce, ciphertext })
}

/// Decrypts data produced by [`encrypt`].
pub fn decrypt(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(&data.nonce), &data.ciphertext[..])
        .map_err(|_| CryptoError::Decryption("wrong key or tampered data".to_string()))
}

/// Payload AEAD algorithms. The discriminant is the on-wire identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    #[default]
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305 = 1,
    #[serde(rename = "xchacha20-poly1305")]
    XChaCha20Poly1305 = 2,
}

impl CipherAlgorithm {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::ChaCha20Poly1305),
            2 => Some(Self::XChaCha20Poly1305),
            _ => None,
        }
    }

    pub fn nonce_size(self) -> usize {
        match self {
            Self::ChaCha20Poly1305 => NONCE_SIZE,
            Self::XChaCha20Poly1305 => XNONCE_SIZE,
        }
    }

    /// Generates a random nonce of the right size for this algorithm.
    pub fn generate_nonce(self) -> CryptoResult<Vec<u8>> {
        let mut nonce = vec![0u8; self.nonce_size()];
        fill_random(&mut nonce)?;
        Ok(nonce)
    }

    fn check_nonce(self, nonce: &[u8]) -> CryptoResult<()> {
        if nonce.len() != self.nonce_size() {
            return Err(CryptoError::InvalidNonceLength {
                expected: self.nonce_size(),
                actual: nonce.len(),
            });
        }
        Ok(())
    }
}

/// Encrypts `plaintext` binding `aad`, returning ciphertext with the tag appended.
pub fn seal_payload(
    algorithm: CipherAlgorithm,
    key: &DerivedKey,
    nonce: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    algorithm.check_nonce(nonce)?;
    let payload = Payload {
        msg: plaintext,
        aad,
    };
    let key = Key::from_slice(key.as_bytes());

    let result = match algorithm {
        CipherAlgorithm::ChaCha20Poly1305 => {
            ChaCha20Poly1305::new(key).encrypt(Nonce::from_slice(nonce), payload)
        }
        CipherAlgorithm::XChaCha20Poly1305 => {
            XChaCha20Poly1305::new(key).encrypt(XNonce::from_slice(nonce), payload)
        }
    };
    result.map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Verifies the tag and decrypts. Nothing is returned unless the tag verifies.
pub fn open_payload(
    algorithm: CipherAlgorithm,
    key: &DerivedKey,
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    algorithm.check_nonce(nonce)?;
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::Decryption(
            "ciphertext shorter than authentication tag".to_string(),
        ));
    }
    let payload = Payload {
        msg: ciphertext,
        aad,
    };
    let key = Key::from_slice(key.as_bytes());

    let result = match algorithm {
        CipherAlgorithm::ChaCha20Poly1305 => {
            ChaCha20Poly1305::new(key).decrypt(Nonce::from_slice(nonce), payload)
        }
        CipherAlgorithm::XChaCha20Poly1305 => {
            XChaCha20Poly1305::new(key).decrypt(XNonce::from_slice(nonce), payload)
        }
    };
    result.map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))
}
