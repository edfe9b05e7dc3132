//! Recipients an envelope is built for.
//!
//! The registry only exists while an envelope is being constructed. Key
//! recipients are identified by a caller-chosen id, which must be unique.
//! At most one password recipient is accepted.

use crate::error::{CryptorError, CryptorResult};
use crypto_box::PublicKey;
use sealbox_crypto::{parse_public_key, CryptoError};
use zeroize::Zeroizing;

/// A recipient that unlocks the envelope with an X25519 private key.
#[derive(Clone, Debug)]
pub struct KeyRecipient {
    pub id: String,
    pub public_key: PublicKey,
}

/// A recipient that unlocks the envelope with a password.
pub struct PasswordRecipient {
    password: Zeroizing<String>,
}

impl PasswordRecipient {
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for PasswordRecipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordRecipient([REDACTED])")
    }
}

/// Recipients collected before encryption.
#[derive(Debug, Default)]
pub struct RecipientRegistry {
    keys: Vec<KeyRecipient>,
    password: Option<PasswordRecipient>,
}

impl RecipientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a key recipient.
    pub fn add_key_recipient(&mut self, id: &str, public_key: &[u8]) -> CryptorResult<()> {
        if id.is_empty() {
            return Err(CryptorError::InvalidKey(
                "invalid recipient id: id is empty".to_string(),
            ));
        }
        if u16::try_from(id.len()).is_err() {
            return Err(CryptorError::InvalidKey(format!(
                "invalid recipient id: longer than {} bytes",
                u16::MAX
            )));
        }
        if self.contains(id) {
            return Err(CryptorError::DuplicateRecipient(id.to_string()));
        }

        let public_key = parse_public_key(public_key).map_err(|e| match e {
            CryptoError::InvalidKeyLength { expected, actual } => CryptorError::InvalidKey(
                format!("public key must be {expected} bytes, got {actual}"),
            ),
            other => CryptorError::InvalidKey(other.to_string()),
        })?;

        self.keys.push(KeyRecipient {
            id: id.to_string(),
            public_key,
        });
        Ok(())
    }

    /// Registers the password recipient.
    pub fn add_password_recipient(&mut self, password: &str) -> CryptorResult<()> {
        if password.is_empty() {
            return Err(CryptorError::EmptyPassword);
        }
        if self.password.is_some() {
            return Err(CryptorError::DuplicateRecipient(
                "password recipient already registered".to_string(),
            ));
        }

        self.password = Some(PasswordRecipient {
            password: Zeroizing::new(password.to_string()),
        });
        Ok(())
    }

    /// Returns whether a key recipient with `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.keys.iter().any(|r| r.id == id)
    }

    pub fn key_recipients(&self) -> &[KeyRecipient] {
        &self.keys
    }

    pub fn password_recipient(&self) -> Option<&PasswordRecipient> {
        self.password.as_ref()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Total number of recipients, key and password.
    pub fn len(&self) -> usize {
        self.keys.len() + usize::from(self.password.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
