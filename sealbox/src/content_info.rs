//! Content-info header codec.
//!
//! The header describes everything needed to open a payload except the
//! credential: cipher, payload nonce and one wrapped CEK per recipient. It
//! is either embedded in front of the ciphertext or carried separately.
//!
//! Layout (integers little-endian):
//!
//! ```text
//! magic        "SBX\0"
//! version      u8
//! flags        u8          bit 0: embedded in front of the ciphertext
//! cipher       u8
//! nonce_len    u8, nonce
//! entry_count  u16
//! entry        kind u8
//!   key        id_len u16, id, ephemeral_pk [32], nonce [24]
//!   password   salt_len u8, salt, m_cost u32, t_cost u32, p_cost u32, nonce [12]
//!              wrapped_len u32, wrapped
//! ```

use crate::error::{CryptorError, CryptorResult};
use sealbox_crypto::{
    CipherAlgorithm, EncryptedData, KdfParams, PasswordWrappedKey, SealedKey, BOX_NONCE_SIZE,
    PASSWORD_WRAP_NONCE_SIZE, X25519_KEY_SIZE,
};
use std::collections::HashSet;

/// Leading bytes of every header.
pub const MAGIC: [u8; 4] = *b"SBX\0";

/// Current header format version.
pub const FORMAT_VERSION: u8 = 1;

const FLAG_EMBEDDED: u8 = 0x01;
const KNOWN_FLAGS: u8 = FLAG_EMBEDDED;

const KIND_KEY: u8 = 1;
const KIND_PASSWORD: u8 = 2;

const MIN_SALT_LEN: usize = 8;

/// Most password entries a header may carry. Each one costs a full key
/// derivation on decrypt.
pub const MAX_PASSWORD_ENTRIES: usize = 4;

// Upper bounds on KDF costs read from untrusted headers.
const MAX_KDF_MEMORY_KIB: u32 = 1 << 20;
const MAX_KDF_ITERATIONS: u32 = 64;
const MAX_KDF_PARALLELISM: u32 = 64;

/// One wrapped copy of the CEK.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WrappedKeyEntry {
    /// CEK sealed to a key recipient's public key.
    Key {
        recipient_id: String,
        sealed: SealedKey,
    },
    /// CEK wrapped under a password-derived key.
    Password(PasswordWrappedKey),
}

/// Parsed content-info header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentInfo {
    /// Whether the header travels in front of the ciphertext.
    pub embedded: bool,
    pub cipher: CipherAlgorithm,
    pub nonce: Vec<u8>,
    pub entries: Vec<WrappedKeyEntry>,
}

impl ContentInfo {
    /// Returns true if `bytes` starts with the header magic.
    pub fn has_magic(bytes: &[u8]) -> bool {
        bytes.starts_with(&MAGIC)
    }

    /// Ids of all key recipients, in header order.
    pub fn recipient_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            WrappedKeyEntry::Key { recipient_id, .. } => Some(recipient_id.as_str()),
            WrappedKeyEntry::Password(_) => None,
        })
    }

    pub fn find_key_entry(&self, recipient_id: &str) -> Option<&SealedKey> {
        self.entries.iter().find_map(|entry| match entry {
            WrappedKeyEntry::Key {
                recipient_id: id,
                sealed,
            } if id == recipient_id => Some(sealed),
            _ => None,
        })
    }

    pub fn password_entries(&self) -> impl Iterator<Item = &PasswordWrappedKey> {
        self.entries.iter().filter_map(|entry| match entry {
            WrappedKeyEntry::Password(wrapped) => Some(wrapped),
            WrappedKeyEntry::Key { .. } => None,
        })
    }

    pub fn has_password_entries(&self) -> bool {
        self.password_entries().next().is_some()
    }

    /// Serializes the header.
    pub fn encode(&self) -> CryptorResult<Vec<u8>> {
        if self.nonce.len() != self.cipher.nonce_size() {
            return Err(malformed(format!(
                "nonce is {} bytes, cipher needs {}",
                self.nonce.len(),
                self.cipher.nonce_size()
            )));
        }
        let entry_count = u16::try_from(self.entries.len())
            .map_err(|_| malformed("too many recipients".to_string()))?;

        let mut out = Vec::with_capacity(64 + self.entries.len() * 128);
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.push(if self.embedded { FLAG_EMBEDDED } else { 0 });
        out.push(self.cipher.id());
        out.push(self.nonce.len() as u8);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&entry_count.to_le_bytes());

        for entry in &self.entries {
            match entry {
                WrappedKeyEntry::Key {
                    recipient_id,
                    sealed,
                } => {
                    let id_len = u16::try_from(recipient_id.len())
                        .map_err(|_| malformed("recipient id too long".to_string()))?;
                    out.push(KIND_KEY);
                    out.extend_from_slice(&id_len.to_le_bytes());
                    out.extend_from_slice(recipient_id.as_bytes());
                    out.extend_from_slice(&sealed.ephemeral_public_key);
                    out.extend_from_slice(&sealed.nonce);
                    put_wrapped(&mut out, &sealed.ciphertext)?;
                }
                WrappedKeyEntry::Password(wrapped) => {
                    let salt_len = u8::try_from(wrapped.salt.len())
                        .map_err(|_| malformed("salt too long".to_string()))?;
                    out.push(KIND_PASSWORD);
                    out.push(salt_len);
                    out.extend_from_slice(&wrapped.salt);
                    out.extend_from_slice(&wrapped.kdf.memory_kib.to_le_bytes());
                    out.extend_from_slice(&wrapped.kdf.iterations.to_le_bytes());
                    out.extend_from_slice(&wrapped.kdf.parallelism.to_le_bytes());
                    out.extend_from_slice(&wrapped.encrypted.nonce);
                    put_wrapped(&mut out, &wrapped.encrypted.ciphertext)?;
                }
            }
        }

        Ok(out)
    }

    /// Parses a detached header. Trailing bytes are rejected.
    pub fn decode(bytes: &[u8]) -> CryptorResult<Self> {
        let (info, consumed) = Self::decode_prefix(bytes)?;
        if consumed != bytes.len() {
            return Err(malformed(format!(
                "{} trailing bytes after content info",
                bytes.len() - consumed
            )));
        }
        Ok(info)
    }

    /// Parses a header at the start of `bytes`, returning it with the number
    /// of bytes it occupies.
    pub fn decode_prefix(bytes: &[u8]) -> CryptorResult<(Self, usize)> {
        let mut r = Reader::new(bytes);

        if r.array::<4>("magic")? != MAGIC {
            return Err(malformed("bad magic".to_string()));
        }
        let version = r.u8("version")?;
        if version != FORMAT_VERSION {
            return Err(CryptorError::UnsupportedFormat(format!(
                "content info version {version}"
            )));
        }
        let flags = r.u8("flags")?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(CryptorError::UnsupportedFormat(format!(
                "unknown flags {flags:#04x}"
            )));
        }
        let cipher_id = r.u8("cipher")?;
        let cipher = CipherAlgorithm::from_id(cipher_id).ok_or_else(|| {
            CryptorError::UnsupportedFormat(format!("cipher algorithm {cipher_id}"))
        })?;
        let nonce_len = r.u8("nonce length")? as usize;
        if nonce_len != cipher.nonce_size() {
            return Err(malformed(format!(
                "nonce is {nonce_len} bytes, cipher needs {}",
                cipher.nonce_size()
            )));
        }
        let nonce = r.take(nonce_len, "nonce")?.to_vec();

        let entry_count = r.u16("entry count")?;
        if entry_count == 0 {
            return Err(malformed("no recipient entries".to_string()));
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut seen_ids = HashSet::new();
        let mut password_entries = 0usize;
        for _ in 0..entry_count {
            let entry = match r.u8("entry kind")? {
                KIND_KEY => read_key_entry(&mut r)?,
                KIND_PASSWORD => {
                    password_entries += 1;
                    if password_entries > MAX_PASSWORD_ENTRIES {
                        return Err(malformed(format!(
                            "more than {MAX_PASSWORD_ENTRIES} password entries"
                        )));
                    }
                    read_password_entry(&mut r)?
                }
                other => {
                    return Err(CryptorError::UnsupportedFormat(format!(
                        "recipient entry kind {other}"
                    )));
                }
            };
            if let WrappedKeyEntry::Key { recipient_id, .. } = &entry {
                if !seen_ids.insert(recipient_id.clone()) {
                    return Err(malformed(format!("duplicate recipient id {recipient_id}")));
                }
            }
            entries.push(entry);
        }

        let info = Self {
            embedded: flags & FLAG_EMBEDDED != 0,
            cipher,
            nonce,
            entries,
        };
        Ok((info, r.position()))
    }
}

fn read_key_entry(r: &mut Reader<'_>) -> CryptorResult<WrappedKeyEntry> {
    let id_len = r.u16("recipient id length")? as usize;
    if id_len == 0 {
        return Err(malformed("empty recipient id".to_string()));
    }
    let recipient_id = std::str::from_utf8(r.take(id_len, "recipient id")?)
        .map_err(|_| malformed("recipient id is not valid UTF-8".to_string()))?
        .to_string();
    let ephemeral_public_key = r.array::<X25519_KEY_SIZE>("ephemeral public key")?;
    let nonce = r.array::<BOX_NONCE_SIZE>("key wrap nonce")?;
    let ciphertext = r.wrapped()?;

    Ok(WrappedKeyEntry::Key {
        recipient_id,
        sealed: SealedKey {
            ephemeral_public_key,
            nonce,
            ciphertext,
        },
    })
}

fn read_password_entry(r: &mut Reader<'_>) -> CryptorResult<WrappedKeyEntry> {
    let salt_len = r.u8("salt length")? as usize;
    if salt_len < MIN_SALT_LEN {
        return Err(malformed(format!("salt of {salt_len} bytes is too short")));
    }
    let salt = r.take(salt_len, "salt")?.to_vec();
    let kdf = KdfParams {
        memory_kib: r.u32("memory cost")?,
        iterations: r.u32("time cost")?,
        parallelism: r.u32("parallelism")?,
    };
    if kdf.memory_kib > MAX_KDF_MEMORY_KIB
        || kdf.iterations > MAX_KDF_ITERATIONS
        || kdf.parallelism > MAX_KDF_PARALLELISM
        || kdf.validate().is_err()
    {
        return Err(malformed("key derivation parameters out of range".to_string()));
    }
    let nonce = r.array::<PASSWORD_WRAP_NONCE_SIZE>("password wrap nonce")?;
    let ciphertext = r.wrapped()?;

    Ok(WrappedKeyEntry::Password(PasswordWrappedKey {
        salt,
        kdf,
        encrypted: EncryptedData { nonce, ciphertext },
    }))
}

fn put_wrapped(out: &mut Vec<u8>, wrapped: &[u8]) -> CryptorResult<()> {
    let len =
        u32::try_from(wrapped.len()).map_err(|_| malformed("wrapped key too long".to_string()))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(wrapped);
    Ok(())
}

fn malformed(msg: String) -> CryptorError {
    CryptorError::MalformedEnvelope(msg)
}

/// Bounds-checked cursor over header bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize, what: &str) -> CryptorResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| malformed(format!("truncated while reading {what}")))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> CryptorResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> CryptorResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> CryptorResult<u16> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    fn u32(&mut self, what: &str) -> CryptorResult<u32> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn wrapped(&mut self) -> CryptorResult<Vec<u8>> {
        let len = self.u32("wrapped key length")? as usize;
        Ok(self.take(len, "wrapped key")?.to_vec())
    }
}
