//! Cryptographic primitives for sealbox envelopes.
//!
//! - Argon2id for deriving wrapping keys from passwords
//! - ChaCha20-Poly1305 / XChaCha20-Poly1305 for authenticated encryption
//! - X25519 + XSalsa20-Poly1305 (crypto_box) for sealing keys to recipients
//! - Zeroization of all key material on drop
//!
//! # Architecture
//!
//! Payloads are encrypted with a random content encryption key (CEK). The CEK
//! is then wrapped once per recipient:
//!
//! 1. **Key recipients**: the CEK is sealed to the recipient's X25519 public
//!    key with an ephemeral key pair.
//!
//! 2. **Password recipients**: the CEK is encrypted under a key derived from
//!    the password with Argon2id and a random salt.
//!
//! Envelope layout and recipient bookkeeping live in the `sealbox` crate;
//! this crate only provides the primitives.

mod cipher;
mod error;
mod key;
pub mod keypair;
pub mod wrap;

pub use cipher::{
    decrypt, encrypt, open_payload, seal_payload, CipherAlgorithm, EncryptedData, NONCE_SIZE,
    TAG_SIZE, XNONCE_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, derive_key_with_salt, fill_random, generate_random_key, DerivedKey, KdfParams,
    Salt, KEY_SIZE, SALT_SIZE,
};
pub use keypair::{
    decrypt_private_key, encrypt_private_key, load_private_key, parse_public_key,
    parse_public_key_base64, parse_secret_key, KeyPair, PassphraseProtectedKey, X25519_KEY_SIZE,
};
pub use wrap::{
    open_key, seal_key, unwrap_key_with_password, wrap_key_with_password, PasswordWrappedKey,
    SealedKey, BOX_NONCE_SIZE, PASSWORD_WRAP_NONCE_SIZE,
};
