//! Content-key wrapping.
//!
//! Key recipients get the CEK sealed with X25519 + XSalsa20-Poly1305 using an
//! ephemeral key pair per seal, so the sender's identity is never revealed.
//! Password recipients get the CEK encrypted under an Argon2id-derived key.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key_with_salt, fill_random, KdfParams};
use crate::keypair::{KeyPair, X25519_KEY_SIZE};
use crate::{decrypt, encrypt, DerivedKey, EncryptedData, NONCE_SIZE};
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use zeroize::Zeroizing;

/// XSalsa20 nonce size in bytes.
pub const BOX_NONCE_SIZE: usize = 24;

/// Nonce size used by password wraps.
pub const PASSWORD_WRAP_NONCE_SIZE: usize = NONCE_SIZE;

/// CEK sealed to a recipient's X25519 public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedKey {
    /// Ephemeral X25519 public key (sender side of DH).
    pub ephemeral_public_key: [u8; X25519_KEY_SIZE],
    pub nonce: [u8; BOX_NONCE_SIZE],
    /// Encrypted key followed by the Poly1305 tag.
    pub ciphertext: Vec<u8>,
}

/// CEK wrapped under a password-derived key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordWrappedKey {
    pub salt: Vec<u8>,
    pub kdf: KdfParams,
    pub encrypted: EncryptedData,
}

/// Seals `key` for the holder of `recipient_pk`.
pub fn seal_key(key: &DerivedKey, recipient_pk: &PublicKey) -> CryptoResult<SealedKey> {
    let ephemeral = KeyPair::generate()?;
    let salsa_box = SalsaBox::new(recipient_pk, &ephemeral.secret);

    let mut nonce = [0u8; BOX_NONCE_SIZE];
    fill_random(&mut nonce)?;

    let ciphertext = salsa_box
        .encrypt(crypto_box::Nonce::from_slice(&nonce), &key.as_bytes()[..])
        .map_err(|e| CryptoError::Encryption(format!("key seal failed: {e}")))?;

    Ok(SealedKey {
        ephemeral_public_key: ephemeral.public_key(),
        nonce,
        ciphertext,
    })
}

/// Opens a sealed key with the recipient's secret key.
pub fn open_key(sealed: &SealedKey, recipient_sk: &SecretKey) -> CryptoResult<DerivedKey> {
    let ephemeral_pk = PublicKey::from(sealed.ephemeral_public_key);
    let salsa_box = SalsaBox::new(&ephemeral_pk, recipient_sk);

    let plaintext = Zeroizing::new(
        salsa_box
            .decrypt(
                crypto_box::Nonce::from_slice(&sealed.nonce),
                &sealed.ciphertext[..],
            )
            .map_err(|_| {
                CryptoError::Decryption("key open failed (wrong key or tampered data)".to_string())
            })?,
    );
    DerivedKey::from_slice(&plaintext[..])
}

/// Wraps `key` under a key derived from `password` with a fresh random salt.
pub fn wrap_key_with_password(
    key: &DerivedKey,
    password: &str,
    kdf: &KdfParams,
    salt_len: usize,
) -> CryptoResult<PasswordWrappedKey> {
    let mut salt = vec![0u8; salt_len];
    fill_random(&mut salt)?;

    let wrapping_key = derive_key_with_salt(password, &salt, kdf)?;
    let encrypted = encrypt(&wrapping_key, key.as_bytes())?;

    Ok(PasswordWrappedKey {
        salt,
        kdf: *kdf,
        encrypted,
    })
}

/// Re-derives the wrapping key from `password` and unwraps.
pub fn unwrap_key_with_password(
    wrapped: &PasswordWrappedKey,
    password: &str,
) -> CryptoResult<DerivedKey> {
    let wrapping_key = derive_key_with_salt(password, &wrapped.salt, &wrapped.kdf)?;
    let plaintext = Zeroizing::new(decrypt(&wrapping_key, &wrapped.encrypted)?);
    DerivedKey::from_slice(&plaintext[..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_random_key;
    use crate::SALT_SIZE;

    #[test]
    fn sealed_key_opens_only_for_recipient() {
        let alice = KeyPair::generate().unwrap();
        let mallory = KeyPair::generate().unwrap();
        let cek = generate_random_key().unwrap();

        let sealed = seal_key(&cek, &alice.public).unwrap();
        assert_eq!(
            open_key(&sealed, &alice.secret).unwrap().as_bytes(),
            cek.as_bytes()
        );
        assert!(open_key(&sealed, &mallory.secret).is_err());
    }

    #[test]
    fn password_wrap_round_trip() {
        let cek = generate_random_key().unwrap();
        let wrapped =
            wrap_key_with_password(&cek, "secret", &KdfParams::test(), SALT_SIZE).unwrap();
        assert_eq!(wrapped.salt.len(), SALT_SIZE);

        let opened = unwrap_key_with_password(&wrapped, "secret").unwrap();
        assert_eq!(opened.as_bytes(), cek.as_bytes());
        assert!(unwrap_key_with_password(&wrapped, "wrong").is_err());
    }
}
