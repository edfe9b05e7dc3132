//! Cryptor configuration.

use crate::error::{CryptorError, CryptorResult};
use sealbox_crypto::{CipherAlgorithm, KdfParams, SALT_SIZE};
use serde::{Deserialize, Serialize};

/// Smallest salt Argon2 accepts.
const MIN_SALT_LEN: usize = 8;

/// Configuration owned by a single cryptor instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptorConfig {
    /// AEAD used for the payload.
    pub cipher: CipherAlgorithm,

    /// Argon2id costs for password recipients.
    pub kdf: KdfParams,

    /// Salt length in bytes for password recipients.
    pub salt_len: usize,
}

impl Default for CryptorConfig {
    fn default() -> Self {
        Self {
            cipher: CipherAlgorithm::ChaCha20Poly1305,
            kdf: KdfParams::default(),
            salt_len: SALT_SIZE,
        }
    }
}

impl CryptorConfig {
    /// Config with minimal KDF costs, for tests.
    pub fn test() -> Self {
        Self {
            kdf: KdfParams::test(),
            ..Self::default()
        }
    }

    /// Rejects KDF costs or salt sizes Argon2 would refuse at encryption time.
    pub fn validate(&self) -> CryptorResult<()> {
        self.kdf.validate()?;
        if !(MIN_SALT_LEN..=u8::MAX as usize).contains(&self.salt_len) {
            return Err(CryptorError::Crypto(sealbox_crypto::CryptoError::KeyDerivation(
                format!(
                    "salt length {} outside {MIN_SALT_LEN}..={}",
                    self.salt_len,
                    u8::MAX
                ),
            )));
        }
        Ok(())
    }
}
