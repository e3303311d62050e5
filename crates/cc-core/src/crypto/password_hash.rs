//!
//! Password hashing for account credentials.
//!
//! Encoded layout: `version (1) || salt (16) || argon2id hash (32)`.
//!

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Current version of the encoded password hash format.
pub const HASH_VERSION: u8 = 0x01;

/// Size of the salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of the hash output in bytes.
pub const HASH_SIZE: usize = 32;

/// Total size of the encoded hash (version + salt + hash).
pub const ENCODED_SIZE: usize = 1 + SALT_SIZE + HASH_SIZE;

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),

    #[error("argon2id hashing failed: {0}")]
    Hashing(String),

    #[error("invalid encoded hash length: expected {expected}, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("unsupported hash version: {0}")]
    Version(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct EncodedPasswordHash {
    version: u8,
    salt: [u8; SALT_SIZE],
    hash: [u8; HASH_SIZE],
}

impl EncodedPasswordHash {
    fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(ENCODED_SIZE);
        encoded.push(self.version);
        encoded.extend_from_slice(&self.salt);
        encoded.extend_from_slice(&self.hash);
        encoded
    }

    fn decode(encoded: &[u8]) -> Result<Self, PasswordHashError> {
        if encoded.len() != ENCODED_SIZE {
            return Err(PasswordHashError::Length {
                expected: ENCODED_SIZE,
                actual: encoded.len(),
            });
        }
        let version = encoded[0];
        if version != HASH_VERSION {
            return Err(PasswordHashError::Version(version));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&encoded[1..1 + SALT_SIZE]);

        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&encoded[1 + SALT_SIZE..]);

        Ok(Self {
            version,
            salt,
            hash,
        })
    }
}

/// Argon2id hasher with fixed cost parameters.
///
/// Hashes are only verifiable with a hasher built from the same parameters.
#[derive(Clone, Debug)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// OWASP-recommended cost: 19 MiB memory, 2 iterations, 1 lane.
    pub fn standard() -> Result<Self, PasswordHashError> {
        Self::with_cost(19 * 1024, 2, 1)
    }

    pub fn with_cost(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordHashError> {
        let params = Params::new(m_cost_kib, t_cost, p_cost, Some(HASH_SIZE))
            .map_err(|e| PasswordHashError::Params(e.to_string()))?;
        Ok(Self { params })
    }

    /// Hash a password using Argon2id with a random salt.
    pub fn hash(&self, password: &str) -> Result<Vec<u8>, PasswordHashError> {
        let salt = generate_salt();
        let hash = self.argon2id_hash(password, &salt)?;

        Ok(EncodedPasswordHash {
            version: HASH_VERSION,
            salt,
            hash,
        }
        .encode())
    }

    /// Verify a password against an encoded hash.
    pub fn verify(&self, password: &str, encoded_hash: &[u8]) -> Result<bool, PasswordHashError> {
        let decoded = EncodedPasswordHash::decode(encoded_hash)?;
        let computed = self.argon2id_hash(password, &decoded.salt)?;
        Ok(computed.ct_eq(&decoded.hash).into())
    }

    fn argon2id_hash(
        &self,
        password: &str,
        salt: &[u8; SALT_SIZE],
    ) -> Result<[u8; HASH_SIZE], PasswordHashError> {
        let mut output = [0u8; HASH_SIZE];
        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        argon
            .hash_password_into(password.as_bytes(), salt, &mut output)
            .map_err(|e| PasswordHashError::Hashing(e.to_string()))?;
        Ok(output)
    }
}

fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    let mut rng = rand::rng();
    rng.fill_bytes(&mut salt);
    salt
}
