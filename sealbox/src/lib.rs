//! Hybrid password/key envelope encryption.
//!
//! A [`Cryptor`] encrypts a payload once under a random content key and
//! wraps that key for every recipient: X25519 key recipients identified by
//! an id, and an optional password recipient. Any single recipient can later
//! open the envelope on a new cryptor instance.
//!
//! ```no_run
//! use sealbox::{Cryptor, KeyPair};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeyPair::generate()?;
//!
//! let mut cryptor = Cryptor::new();
//! cryptor.add_key_recipient("device-1", &keys.public_key())?;
//! let envelope = cryptor.encrypt_data(b"hello", true)?;
//!
//! let mut decryptor = Cryptor::new();
//! let private_key = keys.private_key();
//! let plaintext = decryptor.decrypt_with_key(&envelope, "device-1", &private_key[..], None)?;
//! assert_eq!(plaintext, b"hello");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod content_info;
pub mod cryptor;
pub mod error;
pub mod registry;

pub use config::CryptorConfig;
pub use content_info::{ContentInfo, WrappedKeyEntry};
pub use cryptor::{Cryptor, CryptorState};
pub use error::{CryptorError, CryptorResult};
pub use registry::{KeyRecipient, PasswordRecipient, RecipientRegistry};
pub use sealbox_crypto::{CipherAlgorithm, KdfParams, KeyPair};
