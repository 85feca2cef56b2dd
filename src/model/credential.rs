//! Credential hashing with bcrypt
//!
//! Hashes are stored in the modular crypt format bcrypt produces
//! (`$2b$<cost>$<salt+digest>`), so the salt and cost travel with the hash.
//! Hashes written by other bcrypt implementations (`$2a$`, `$2y$`) verify too.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// bcrypt work factor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct HashCost(u32);

impl HashCost {
    /// Smallest cost bcrypt accepts. Only suitable for tests.
    pub const MIN: HashCost = HashCost(4);
    pub const MAX: HashCost = HashCost(31);
    /// Conservative production default
    pub const DEFAULT: HashCost = HashCost(bcrypt::DEFAULT_COST);

    pub fn new(cost: u32) -> Result<Self> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&cost) {
            return Err(Error::Config(format!(
                "hash cost must be between {} and {}, got {}",
                Self::MIN.0,
                Self::MAX.0,
                cost
            )));
        }
        Ok(HashCost(cost))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for HashCost {
    type Error = Error;

    fn try_from(cost: u32) -> Result<Self> {
        HashCost::new(cost)
    }
}

impl From<HashCost> for u32 {
    fn from(cost: HashCost) -> Self {
        cost.0
    }
}

/// A salted one-way hash of an account password
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Hash a plaintext password with a fresh random salt
    pub fn generate(password: &str, cost: HashCost) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::Validation("password is empty".into()));
        }
        Ok(CredentialHash(bcrypt::hash(password, cost.get())?))
    }

    /// Wrap a hash read back from storage
    pub fn from_stored(hash: String) -> Self {
        CredentialHash(hash)
    }

    /// Check a plaintext password against this hash.
    ///
    /// A stored value that is not a parseable bcrypt hash never matches.
    pub fn verify(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.0) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "stored credential hash is unreadable");
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}
