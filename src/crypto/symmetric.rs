//! Symmetric encryption with a password-derived key.
//!
//! This module provides length-preserving encryption using:
//! - Argon2id for key derivation from password + random salt
//! - ChaCha20 as the stream cipher (no padding, no tag)
//!
//! Integrity is checked one layer up: the frame magic and CRC-32 are
//! encrypted together with the payload, so a wrong key fails verification.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::kdf::{derive_key, KdfParams, KEY_LEN, SALT_LEN};
use crate::error::StegoError;

/// Nonce size for ChaCha20.
pub const NONCE_LEN: usize = 12;

/// Length of the unencrypted salt + nonce prefix stored in the carrier.
pub const PREFIX_LEN: usize = SALT_LEN + NONCE_LEN;

/// Encrypts `plaintext` with ChaCha20. Output length equals input length.
pub fn encrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Vec<u8> {
    let mut buf = plaintext.to_vec();
    let mut cipher = ChaCha20::new(key.into(), nonce.into());
    cipher.apply_keystream(&mut buf);
    buf
}

/// Decrypts `ciphertext` with ChaCha20. Output length equals input length.
pub fn decrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Vec<u8> {
    // XOR stream: decryption is the same operation
    encrypt(key, nonce, ciphertext)
}

/// Stateful keystream that continues where the previous call stopped.
pub struct Keystream {
    cipher: ChaCha20,
}

impl Keystream {
    /// XORs the next `buf.len()` keystream bytes into `buf`.
    pub fn apply(&mut self, buf: &mut [u8]) {
        self.cipher.apply_keystream(buf);
    }
}

/// Key, nonce and salt for one encode or decode.
pub struct EncryptionContext {
    key: Zeroizing<[u8; KEY_LEN]>,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
}

impl EncryptionContext {
    /// Generates a fresh salt and nonce from the OS RNG and derives the key.
    pub fn generate(password: &str, params: &KdfParams) -> Result<Self, StegoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        Self::derive(password, salt, nonce, params)
    }

    /// Re-derives the context from a stored salt and nonce.
    pub fn derive(
        password: &str,
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        params: &KdfParams,
    ) -> Result<Self, StegoError> {
        let key = derive_key(password, &salt, params)?;
        Ok(Self { key, salt, nonce })
    }

    /// Rebuilds the context from the carrier's unencrypted prefix.
    pub fn from_prefix(
        password: &str,
        prefix: &[u8; PREFIX_LEN],
        params: &KdfParams,
    ) -> Result<Self, StegoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        salt.copy_from_slice(&prefix[..SALT_LEN]);
        nonce.copy_from_slice(&prefix[SALT_LEN..]);

        Self::derive(password, salt, nonce, params)
    }

    /// Returns the salt.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Returns the nonce.
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Returns the salt || nonce prefix written ahead of the ciphertext.
    pub fn prefix(&self) -> [u8; PREFIX_LEN] {
        let mut out = [0u8; PREFIX_LEN];
        out[..SALT_LEN].copy_from_slice(&self.salt);
        out[SALT_LEN..].copy_from_slice(&self.nonce);
        out
    }

    /// Starts a keystream at offset zero.
    pub fn keystream(&self) -> Keystream {
        Keystream {
            cipher: ChaCha20::new((&*self.key).into(), (&self.nonce).into()),
        }
    }

    /// Encrypts a whole buffer from offset zero.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        encrypt(&self.key, &self.nonce, plaintext)
    }

    /// Decrypts a whole buffer from offset zero.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        decrypt(&self.key, &self.nonce, ciphertext)
    }
}
