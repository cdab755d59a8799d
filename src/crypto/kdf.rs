//! Password-based key derivation (Argon2id).
//!
//! The same password, salt and parameters always produce the same key.
//! Parameters are not stored in the carrier, so encoder and decoder must
//! agree on them.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::StegoError;

/// Derived key length in bytes (ChaCha20 key size).
pub const KEY_LEN: usize = 32;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// Interactive profile: 64 MiB, 3 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Creates parameters with explicit costs.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Checks the parameters against Argon2's limits.
    pub fn validate(&self) -> Result<(), StegoError> {
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(&self) -> Result<Params, StegoError> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| StegoError::KeyDerivation(e.to_string()))
    }
}

/// Derives a 256-bit key from a password and salt.
///
/// Fails with [`StegoError::InvalidParameter`] on an empty password.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, StegoError> {
    if password.is_empty() {
        return Err(StegoError::invalid("password must not be empty"));
    }

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut *key)
        .map_err(|e| StegoError::KeyDerivation(e.to_string()))?;

    Ok(key)
}
