//! X25519 key pairs for key-based recipients.
//!
//! Public keys are exchanged as raw 32-byte values. Private keys travel either
//! raw or protected with a password (Argon2id -> ChaCha20-Poly1305), in which
//! case the serialized [`PassphraseProtectedKey`] is the private key blob.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, fill_random, KdfParams, Salt};
use crate::{decrypt, encrypt, EncryptedData};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_box::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

/// Size of an X25519 public or secret key in bytes.
pub const X25519_KEY_SIZE: usize = 32;

/// X25519 key pair.
///
/// The secret key implements `ZeroizeOnDrop` (from crypto_box).
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generates a new key pair from the OS random source.
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = Zeroizing::new([0u8; X25519_KEY_SIZE]);
        fill_random(&mut bytes[..])?;
        Ok(Self::from_secret_bytes(*bytes))
    }

    /// Reconstructs a key pair from raw secret key bytes.
    pub fn from_secret_bytes(mut bytes: [u8; X25519_KEY_SIZE]) -> Self {
        let secret = SecretKey::from(bytes);
        bytes.zeroize();
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Returns the public key as raw bytes.
    pub fn public_key(&self) -> [u8; X25519_KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Returns the raw secret key. The caller owns the wiping of the copy.
    pub fn private_key(&self) -> Zeroizing<[u8; X25519_KEY_SIZE]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// Returns the public key as standard base64.
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public.as_bytes())
    }

    /// Exports the secret key protected by `password`, serialized as JSON.
    pub fn encrypted_private_key(
        &self,
        password: &str,
        params: &KdfParams,
    ) -> CryptoResult<Vec<u8>> {
        let protected = encrypt_private_key(&self.secret, password, params)?;
        Ok(serde_json::to_vec(&protected)?)
    }
}

/// Parses and validates a raw X25519 public key.
///
/// The all-zero point is rejected since any exchange with it yields a
/// predictable shared secret.
pub fn parse_public_key(bytes: &[u8]) -> CryptoResult<PublicKey> {
    let array: [u8; X25519_KEY_SIZE] =
        bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: X25519_KEY_SIZE,
                actual: bytes.len(),
            })?;
    if array.iter().all(|b| *b == 0) {
        return Err(CryptoError::InvalidKey("all-zero public key".to_string()));
    }
    Ok(PublicKey::from(array))
}

/// Decodes a base64 public key produced by [`KeyPair::public_key_base64`].
pub fn parse_public_key_base64(encoded: &str) -> CryptoResult<PublicKey> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| CryptoError::InvalidKey(format!("invalid base64 public key: {e}")))?;
    parse_public_key(&bytes)
}

/// Parses a raw 32-byte X25519 secret key.
pub fn parse_secret_key(bytes: &[u8]) -> CryptoResult<SecretKey> {
    let mut array: [u8; X25519_KEY_SIZE] =
        bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: X25519_KEY_SIZE,
                actual: bytes.len(),
            })?;
    let secret = SecretKey::from(array);
    array.zeroize();
    Ok(secret)
}

/// Private key encrypted with a password (Argon2id -> ChaCha20-Poly1305).
///
/// Bundles the salt and cost parameters with the ciphertext so the password
/// is the only other input needed for decryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassphraseProtectedKey {
    pub salt: Salt,
    pub kdf: KdfParams,
    pub encrypted: EncryptedData,
}

/// Encrypts a private key with a password.
pub fn encrypt_private_key(
    sk: &SecretKey,
    password: &str,
    params: &KdfParams,
) -> CryptoResult<PassphraseProtectedKey> {
    let salt = Salt::random()?;
    let derived = derive_key(password, &salt, params)?;
    let secret = Zeroizing::new(sk.to_bytes());
    let encrypted = encrypt(&derived, &secret[..])?;

    Ok(PassphraseProtectedKey {
        salt,
        kdf: *params,
        encrypted,
    })
}

/// Decrypts a password-protected private key.
pub fn decrypt_private_key(
    protected: &PassphraseProtectedKey,
    password: &str,
) -> CryptoResult<SecretKey> {
    let derived = derive_key(password, &protected.salt, &protected.kdf)?;
    let plaintext = Zeroizing::new(decrypt(&derived, &protected.encrypted)?);
    parse_secret_key(&plaintext[..])
}

/// Loads a private key blob: raw bytes without a password, or a serialized
/// [`PassphraseProtectedKey`] when `password` is given.
pub fn load_private_key(bytes: &[u8], password: Option<&str>) -> CryptoResult<SecretKey> {
    match password {
        None => parse_secret_key(bytes),
        Some(password) => {
            let protected: PassphraseProtectedKey = serde_json::from_slice(bytes)?;
            decrypt_private_key(&protected, password)
        }
    }
}
