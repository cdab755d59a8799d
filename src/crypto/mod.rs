//! Cryptographic operations for stegsuite.
//!
//! This module provides:
//! - Password-based key derivation (Argon2id, random per-encode salt)
//! - Length-preserving symmetric encryption (ChaCha20)
//!
//! The salt and nonce travel unencrypted in front of the ciphertext so the
//! decoder can re-derive the key before reading the frame.

pub mod kdf;
pub mod symmetric;

pub use kdf::{derive_key, KdfParams, KEY_LEN, SALT_LEN};
pub use symmetric::{decrypt, encrypt, EncryptionContext, Keystream, NONCE_LEN, PREFIX_LEN};
