//! Salted one-way credential hashing.
//!
//! Uses Argon2id with a per-call random salt. The output is a PHC string
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<digest>`) that carries the
//! algorithm, cost parameters, and salt alongside the digest, so a stored
//! hash can be verified without any side-channel configuration.

use crate::error::{RedactionError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

/// Number of random salt bytes drawn per hash.
pub const SALT_LENGTH: usize = 16;

/// PHC identifier of the algorithm new hashes are produced with.
pub const ALGORITHM_ID: &str = "argon2id";

/// How far above the configured cost a stored hash may go and still be
/// verified. Each of memory, passes, and lanes is bounded separately.
pub const MAX_COST_FACTOR: u32 = 8;

/// Argon2 cost factor.
///
/// Fixed by configuration; callers of [`CredentialHasher::hash`] never pick it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCost {
    /// Memory size in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Number of passes.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    Params::DEFAULT_M_COST
}

fn default_iterations() -> u32 {
    Params::DEFAULT_T_COST
}

fn default_parallelism() -> u32 {
    Params::DEFAULT_P_COST
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

impl HashCost {
    /// Convert to Argon2 parameters, rejecting values Argon2 refuses.
    pub fn to_params(&self) -> Result<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| RedactionError::HashingError(format!("invalid hash cost: {}", e)))
    }

    /// Whether a stored hash's parameters are within [`MAX_COST_FACTOR`] of
    /// this cost.
    fn admits(&self, params: &Params) -> bool {
        params.m_cost() <= self.memory_kib.saturating_mul(MAX_COST_FACTOR)
            && params.t_cost() <= self.iterations.saturating_mul(MAX_COST_FACTOR)
            && params.p_cost() <= self.parallelism.saturating_mul(MAX_COST_FACTOR)
    }

    fn matches(&self, params: &Params) -> bool {
        params.m_cost() == self.memory_kib
            && params.t_cost() == self.iterations
            && params.p_cost() == self.parallelism
    }
}

/// Encoded credential hash: algorithm, salt, and digest in PHC form.
///
/// Safe for durable storage. Two hashes of the same secret never compare
/// equal because each carries its own salt.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Parse and validate an encoded hash.
    pub fn parse(encoded: &str) -> Result<Self> {
        let parsed =
            PasswordHash::new(encoded).map_err(|e| RedactionError::HashDecode(e.to_string()))?;
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(RedactionError::HashDecode(
                "missing salt or digest".to_string(),
            ));
        }
        Ok(Self(encoded.to_string()))
    }

    /// Parse an encoded hash from raw bytes (as read back from storage).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let encoded = std::str::from_utf8(bytes)
            .map_err(|_| RedactionError::HashDecode("hash is not valid UTF-8".to_string()))?;
        Self::parse(encoded)
    }

    /// The PHC string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The PHC string as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume into the PHC string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CredentialHash").field(&self.0).finish()
    }
}

impl std::fmt::Display for CredentialHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<[u8]> for CredentialHash {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Derives and verifies salted credential hashes.
///
/// Stateless apart from its immutable cost, so a single instance can be
/// shared across threads. Both operations are deliberately CPU and memory
/// bound; run them off latency-sensitive paths.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    cost: HashCost,
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with the given cost factor.
    pub fn new(cost: HashCost) -> Result<Self> {
        let params = cost.to_params()?;
        Ok(Self { cost, params })
    }

    /// The configured cost factor.
    pub fn cost(&self) -> HashCost {
        self.cost
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a secret with a freshly generated salt.
    pub fn hash(&self, secret: impl AsRef<[u8]>) -> Result<CredentialHash> {
        let salt = generate_salt()?;
        let encoded = self
            .argon2()
            .hash_password(secret.as_ref(), &salt)
            .map_err(|e| RedactionError::HashingError(format!("password hashing failed: {}", e)))?
            .to_string();
        Ok(CredentialHash(encoded))
    }

    /// Check a secret against a stored hash.
    ///
    /// The salt and cost are taken from the hash itself. Returns `false` for
    /// a wrong secret, for a hash that cannot be decoded, and for a hash
    /// whose cost exceeds the configured one by more than
    /// [`MAX_COST_FACTOR`].
    pub fn verify(&self, secret: impl AsRef<[u8]>, hash: &CredentialHash) -> bool {
        self.verify_encoded(secret, hash.as_str())
    }

    /// Like [`verify`](Self::verify), for a hash read back as a raw string.
    pub fn verify_encoded(&self, secret: impl AsRef<[u8]>, encoded: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };
        match Params::try_from(&parsed) {
            Ok(params) if self.cost.admits(&params) => {}
            _ => return false,
        }
        self.argon2()
            .verify_password(secret.as_ref(), &parsed)
            .is_ok()
    }

    /// Whether a stored hash should be regenerated under the current cost.
    ///
    /// True when the hash uses another algorithm, another cost, or cannot be
    /// decoded at all.
    pub fn needs_rehash(&self, hash: &CredentialHash) -> bool {
        let Ok(parsed) = PasswordHash::new(hash.as_str()) else {
            return true;
        };
        if parsed.algorithm.as_str() != ALGORITHM_ID {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(params) => !self.cost.matches(&params),
            Err(_) => true,
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        let cost = HashCost::default();
        Self {
            cost,
            params: Params::default(),
        }
    }
}

fn generate_salt() -> Result<SaltString> {
    let mut bytes = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut bytes).map_err(|e| {
        RedactionError::HashingError(format!("failed to generate random salt: {}", e))
    })?;
    SaltString::encode_b64(&bytes)
        .map_err(|e| RedactionError::HashingError(format!("failed to encode salt: {}", e)))
}
