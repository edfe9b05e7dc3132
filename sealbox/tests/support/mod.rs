//! Shared helpers for cryptor integration tests.

#![allow(dead_code)]

use sealbox::{Cryptor, CryptorConfig, KeyPair};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const MESSAGE: &[u8] = b"Secret message which is necessary to be encrypted.";

/// Installs a test-writer subscriber once; filter via `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Cryptor with cheap KDF costs.
pub fn cryptor() -> Cryptor {
    init_tracing();
    Cryptor::with_config(CryptorConfig::test())
}

/// Random recipient id, as a caller would mint for a new device.
pub fn recipient_id() -> String {
    Uuid::new_v4().to_string()
}

/// Encrypts `payload` for a single fresh key recipient.
pub fn encrypt_for_key(payload: &[u8], embed: bool) -> (Vec<u8>, Vec<u8>, String, KeyPair) {
    let keys = KeyPair::generate().expect("key generation must succeed");
    let id = recipient_id();

    let mut encryptor = cryptor();
    encryptor
        .add_key_recipient(&id, &keys.public_key())
        .expect("recipient must be accepted");
    let data = encryptor
        .encrypt_data(payload, embed)
        .expect("encryption must succeed");
    let info = encryptor
        .content_info()
        .expect("content info must be available");
    (data, info, id, keys)
}

/// Encrypts `payload` for a single password recipient.
pub fn encrypt_for_password(payload: &[u8], password: &str, embed: bool) -> (Vec<u8>, Vec<u8>) {
    let mut encryptor = cryptor();
    encryptor
        .add_password_recipient(password)
        .expect("password must be accepted");
    let data = encryptor
        .encrypt_data(payload, embed)
        .expect("encryption must succeed");
    let info = encryptor
        .content_info()
        .expect("content info must be available");
    (data, info)
}
