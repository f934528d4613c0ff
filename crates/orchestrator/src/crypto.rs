//! Encryption of company-owned provider keys at rest.
//!
//! Stored form: `secretbox-v1:` followed by base64 of `nonce || ciphertext`
//! (XSalsa20-Poly1305, 24-byte random nonce).

use std::env;

use base64::Engine;
use rand_core::{OsRng, RngCore};
use thiserror::Error;
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305};

const SECRETBOX_TAG: &str = "secretbox-v1";
const SECRETBOX_KEY_LEN: usize = 32;
const SECRETBOX_NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("missing credentials key")]
    MissingKey,
    #[error("invalid credentials key length: {0}")]
    InvalidKeyLength(usize),
    #[error("invalid ciphertext length: {0}")]
    InvalidCiphertextLength(usize),
    #[error("stored secret is not secretbox-v1")]
    UnknownFormat,
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("decrypted secret is not UTF-8")]
    Utf8,
    #[error("crypto failure")]
    Aead,
}

/// Seals and opens provider keys with a server-held secret.
#[derive(Clone)]
pub struct KeyCipher {
    key: [u8; SECRETBOX_KEY_LEN],
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCipher").finish_non_exhaustive()
    }
}

impl KeyCipher {
    /// Read the key from an environment variable (hex, `hex:`-prefixed or base64).
    pub fn from_env(var: &str) -> Result<Self, CryptoError> {
        let value = env::var(var).map_err(|_| CryptoError::MissingKey)?;
        Self::from_encoded(&value)
    }

    /// Parse a 32-byte key given as hex, `hex:`-prefixed hex or base64.
    pub fn from_encoded(value: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            key: decode_key(value)?,
        })
    }

    /// Encrypt a secret into its stored form.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&self.key));
        let mut nonce_bytes = [0u8; SECRETBOX_NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Aead)?;

        let mut out = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);

        Ok(format!(
            "{SECRETBOX_TAG}:{}",
            base64::engine::general_purpose::STANDARD.encode(out)
        ))
    }

    /// Decrypt a stored secret.
    pub fn open(&self, stored: &str) -> Result<String, CryptoError> {
        let encoded = stored
            .trim()
            .strip_prefix(SECRETBOX_TAG)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or(CryptoError::UnknownFormat)?;
        let input = base64::engine::general_purpose::STANDARD.decode(encoded)?;

        if input.len() < SECRETBOX_NONCE_LEN {
            return Err(CryptoError::InvalidCiphertextLength(input.len()));
        }
        let (nonce_bytes, ciphertext) = input.split_at(SECRETBOX_NONCE_LEN);
        let cipher = XSalsa20Poly1305::new(Key::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Aead)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
    }
}

fn decode_key(value: &str) -> Result<[u8; SECRETBOX_KEY_LEN], CryptoError> {
    let trimmed = value.trim();
    let bytes = if let Some(hex_value) = trimmed.strip_prefix("hex:") {
        hex::decode(hex_value)?
    } else if is_probably_hex(trimmed) {
        hex::decode(trimmed)?
    } else {
        base64::engine::general_purpose::STANDARD.decode(trimmed)?
    };

    let key: [u8; SECRETBOX_KEY_LEN] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
    Ok(key)
}

fn is_probably_hex(value: &str) -> bool {
    value.len() == SECRETBOX_KEY_LEN * 2 && value.chars().all(|c| c.is_ascii_hexdigit())
}
