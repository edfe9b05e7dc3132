//! Hybrid cryptor.
//!
//! Builds envelopes for a set of recipients and opens them with a single
//! recipient credential. Each instance performs one logical operation: one
//! encryption, or one decryption. Open an envelope on a fresh instance.
//!
//! ```text
//! Fresh --add_*_recipient--> Configured --encrypt_data--> Encrypted
//! Fresh --set_content_info--> ContentInfoSet
//! Fresh | ContentInfoSet --decrypt_*--> Terminal
//! ```

use crate::config::CryptorConfig;
use crate::content_info::{ContentInfo, WrappedKeyEntry};
use crate::error::{CryptorError, CryptorResult};
use crate::registry::RecipientRegistry;
use sealbox_crypto::{
    generate_random_key, load_private_key, open_key, open_payload, seal_key, seal_payload,
    unwrap_key_with_password, wrap_key_with_password, CryptoError, DerivedKey,
};
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of a [`Cryptor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CryptorState {
    /// No recipients and no content info.
    Fresh,
    /// At least one recipient registered.
    Configured,
    /// An envelope was built; only `content_info` remains available.
    Encrypted,
    /// A detached header was loaded for decryption.
    ContentInfoSet,
    /// A decryption was attempted. Nothing further is allowed.
    Terminal,
}

impl CryptorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Configured => "configured",
            Self::Encrypted => "encrypted",
            Self::ContentInfoSet => "content-info-set",
            Self::Terminal => "terminal",
        }
    }
}

impl fmt::Display for CryptorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encrypts for any number of key recipients and one password recipient,
/// and decrypts with one credential.
pub struct Cryptor {
    config: CryptorConfig,
    state: CryptorState,
    registry: RecipientRegistry,
    /// Raw header bytes, exactly as produced or supplied.
    content_info: Option<Vec<u8>>,
    parsed: Option<ContentInfo>,
}

impl Cryptor {
    pub fn new() -> Self {
        Self::with_config(CryptorConfig::default())
    }

    pub fn with_config(config: CryptorConfig) -> Self {
        Self {
            config,
            state: CryptorState::Fresh,
            registry: RecipientRegistry::new(),
            content_info: None,
            parsed: None,
        }
    }

    pub fn state(&self) -> CryptorState {
        self.state
    }

    pub fn config(&self) -> &CryptorConfig {
        &self.config
    }

    /// Adds a recipient that decrypts with the private half of `public_key`.
    pub fn add_key_recipient(&mut self, id: &str, public_key: &[u8]) -> CryptorResult<()> {
        self.expect_configurable("add_key_recipient")?;
        self.registry.add_key_recipient(id, public_key)?;
        self.state = CryptorState::Configured;
        debug!("added key recipient {id}");
        Ok(())
    }

    /// Adds a recipient that decrypts with `password`.
    pub fn add_password_recipient(&mut self, password: &str) -> CryptorResult<()> {
        self.expect_configurable("add_password_recipient")?;
        self.registry.add_password_recipient(password)?;
        self.state = CryptorState::Configured;
        debug!("added password recipient");
        Ok(())
    }

    /// Encrypts `payload` for every registered recipient.
    ///
    /// With `embed_content_info` the header is prepended to the ciphertext;
    /// otherwise only the ciphertext is returned and the header must be
    /// fetched with [`Cryptor::content_info`] and transported alongside.
    pub fn encrypt_data(
        &mut self,
        payload: &[u8],
        embed_content_info: bool,
    ) -> CryptorResult<Vec<u8>> {
        match self.state {
            CryptorState::Fresh => return Err(CryptorError::NoRecipients),
            CryptorState::Configured => {}
            other => return Err(invalid_state("encrypt_data", other)),
        }

        let registry = std::mem::take(&mut self.registry);
        let (info, header, ciphertext) =
            match self.build_envelope(&registry, payload, embed_content_info) {
                Ok(built) => built,
                Err(e) => {
                    self.state = CryptorState::Terminal;
                    return Err(e);
                }
            };
        drop(registry);

        debug!(
            "encrypted {} bytes for {} recipient(s), header {} bytes, embedded={embed_content_info}",
            payload.len(),
            info.entries.len(),
            header.len()
        );

        let output = if embed_content_info {
            let mut out = Vec::with_capacity(header.len() + ciphertext.len());
            out.extend_from_slice(&header);
            out.extend_from_slice(&ciphertext);
            out
        } else {
            ciphertext
        };

        self.content_info = Some(header);
        self.parsed = Some(info);
        self.state = CryptorState::Encrypted;
        Ok(output)
    }

    fn build_envelope(
        &self,
        registry: &RecipientRegistry,
        payload: &[u8],
        embedded: bool,
    ) -> CryptorResult<(ContentInfo, Vec<u8>, Vec<u8>)> {
        self.config.validate()?;

        let cipher = self.config.cipher;
        let cek = generate_random_key()?;
        let nonce = cipher.generate_nonce()?;

        let mut entries = Vec::with_capacity(registry.len());
        for recipient in registry.key_recipients() {
            entries.push(WrappedKeyEntry::Key {
                recipient_id: recipient.id.clone(),
                sealed: seal_key(&cek, &recipient.public_key)?,
            });
        }
        if let Some(recipient) = registry.password_recipient() {
            let wrapped = wrap_key_with_password(
                &cek,
                recipient.password(),
                &self.config.kdf,
                self.config.salt_len,
            )?;
            entries.push(WrappedKeyEntry::Password(wrapped));
        }

        let info = ContentInfo {
            embedded,
            cipher,
            nonce,
            entries,
        };
        // The header is authenticated as associated data of the payload.
        let header = info.encode()?;
        let ciphertext = seal_payload(cipher, &cek, &info.nonce, payload, &header)?;

        Ok((info, header, ciphertext))
    }

    /// Returns the header of the last built envelope, or the one loaded with
    /// [`Cryptor::set_content_info`].
    pub fn content_info(&self) -> CryptorResult<Vec<u8>> {
        match self.state {
            CryptorState::Encrypted | CryptorState::ContentInfoSet => self
                .content_info
                .clone()
                .ok_or(CryptorError::MissingContentInfo),
            _ => Err(CryptorError::MissingContentInfo),
        }
    }

    /// Loads a detached header for a subsequent decryption.
    pub fn set_content_info(&mut self, bytes: &[u8]) -> CryptorResult<()> {
        if self.state != CryptorState::Fresh {
            return Err(invalid_state("set_content_info", self.state));
        }

        let info = ContentInfo::decode(bytes)?;
        debug!(
            "content info set: {} entries, embedded={}",
            info.entries.len(),
            info.embedded
        );
        self.content_info = Some(bytes.to_vec());
        self.parsed = Some(info);
        self.state = CryptorState::ContentInfoSet;
        Ok(())
    }

    /// Decrypts with a key recipient's private key.
    ///
    /// `private_key` is the raw 32-byte secret, or a password-protected key
    /// blob when `key_password` is given.
    pub fn decrypt_with_key(
        &mut self,
        data: &[u8],
        recipient_id: &str,
        private_key: &[u8],
        key_password: Option<&str>,
    ) -> CryptorResult<Vec<u8>> {
        let (info, header, ciphertext) = self.begin_decrypt("decrypt_with_key", data)?;

        let sealed = info
            .find_key_entry(recipient_id)
            .ok_or_else(|| CryptorError::RecipientNotFound(recipient_id.to_string()))?;

        let secret = load_private_key(private_key, key_password).map_err(|e| match e {
            CryptoError::Decryption(_) => {
                CryptorError::InvalidKey("private key password is incorrect".to_string())
            }
            other => CryptorError::InvalidKey(other.to_string()),
        })?;

        let cek = open_key(sealed, &secret).map_err(|_| {
            debug!("key unwrap failed for recipient {recipient_id}");
            CryptorError::UnwrapFailure(format!(
                "private key does not open the entry for {recipient_id}"
            ))
        })?;

        open_checked(&info, &cek, &header, ciphertext)
    }

    /// Decrypts with the password recipient's password.
    pub fn decrypt_with_password(
        &mut self,
        data: &[u8],
        password: &str,
    ) -> CryptorResult<Vec<u8>> {
        let (info, header, ciphertext) = self.begin_decrypt("decrypt_with_password", data)?;

        let mut attempted = 0usize;
        let mut cek = None;
        for wrapped in info.password_entries() {
            attempted += 1;
            match unwrap_key_with_password(wrapped, password) {
                Ok(key) => {
                    cek = Some(key);
                    break;
                }
                Err(e) => debug!("password entry {attempted} did not open: {e}"),
            }
        }

        let cek = cek.ok_or_else(|| {
            debug!("password unwrap failed, {attempted} password entries tried");
            if attempted == 0 {
                CryptorError::UnwrapFailure("envelope has no password recipient".to_string())
            } else {
                CryptorError::UnwrapFailure("password does not open the envelope".to_string())
            }
        })?;

        open_checked(&info, &cek, &header, ciphertext)
    }

    /// Resolves the header and the bare ciphertext for a decryption and
    /// moves the instance to `Terminal`.
    fn begin_decrypt<'a>(
        &mut self,
        operation: &'static str,
        data: &'a [u8],
    ) -> CryptorResult<(ContentInfo, Vec<u8>, &'a [u8])> {
        match self.state {
            CryptorState::Fresh | CryptorState::ContentInfoSet => {}
            other => return Err(invalid_state(operation, other)),
        }
        self.state = CryptorState::Terminal;

        if let (Some(info), Some(header)) = (self.parsed.take(), self.content_info.take()) {
            if !info.embedded {
                return Ok((info, header, data));
            }
            let body = data.strip_prefix(header.as_slice()).ok_or_else(|| {
                CryptorError::MalformedEnvelope(
                    "data does not start with the configured content info".to_string(),
                )
            })?;
            return Ok((info, header, body));
        }

        if !ContentInfo::has_magic(data) {
            return Err(CryptorError::MissingContentInfo);
        }
        let (info, consumed) = ContentInfo::decode_prefix(data)?;
        if !info.embedded {
            return Err(CryptorError::MalformedEnvelope(
                "header is marked detached but was found in front of the data".to_string(),
            ));
        }
        Ok((info, data[..consumed].to_vec(), &data[consumed..]))
    }

    fn expect_configurable(&self, operation: &'static str) -> CryptorResult<()> {
        match self.state {
            CryptorState::Fresh | CryptorState::Configured => Ok(()),
            other => Err(invalid_state(operation, other)),
        }
    }
}

impl Default for Cryptor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cryptor")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("recipients", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Verifies the tag and decrypts; plaintext is only released after the tag checks out.
fn open_checked(
    info: &ContentInfo,
    cek: &DerivedKey,
    header: &[u8],
    ciphertext: &[u8],
) -> CryptorResult<Vec<u8>> {
    match open_payload(info.cipher, cek, &info.nonce, ciphertext, header) {
        Ok(plaintext) => {
            debug!("decrypted {} bytes", plaintext.len());
            Ok(plaintext)
        }
        Err(CryptoError::Decryption(_)) => {
            warn!("payload authentication failed");
            Err(CryptorError::IntegrityCheckFailed)
        }
        Err(e) => Err(e.into()),
    }
}

fn invalid_state(operation: &'static str, state: CryptorState) -> CryptorError {
    CryptorError::InvalidState {
        operation,
        state: state.as_str(),
    }
}
