use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_length: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
            output_length: 32,
        }
    }
}

impl Argon2Config {
    /// Cheapest parameters argon2 accepts. Suitable for tests and fixtures only.
    pub fn minimal() -> Self {
        Self {
            memory_cost_kib: 8,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordIssue {
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
}

impl PasswordIssue {
    pub fn message(&self) -> String {
        match self {
            Self::TooShort { min, .. } => {
                format!("Password must be at least {min} characters long")
            }
            Self::TooLong { max, .. } => {
                format!("Password must be at most {max} characters long")
            }
        }
    }
}

/// Argon2id hashing plus the signup password policy.
pub struct PasswordService {
    argon2: Argon2<'static>,
    config: PasswordConfig,
}

impl PasswordService {
    pub fn new(argon2_config: &Argon2Config, password_config: PasswordConfig) -> Result<Self> {
        let params = Params::new(
            argon2_config.memory_cost_kib,
            argon2_config.time_cost,
            argon2_config.parallelism,
            Some(argon2_config.output_length),
        )
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {e}"))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self {
            argon2,
            config: password_config,
        })
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    /// `Ok(false)` for a wrong password, `Err` only for a malformed hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash format: {e}"))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("Password verification failed: {e}")),
        }
    }

    pub fn validate(&self, password: &str) -> Result<(), PasswordIssue> {
        let length = password.chars().count();
        if length < self.config.min_length {
            return Err(PasswordIssue::TooShort {
                min: self.config.min_length,
                actual: length,
            });
        }
        if length > self.config.max_length {
            return Err(PasswordIssue::TooLong {
                max: self.config.max_length,
                actual: length,
            });
        }
        Ok(())
    }
}
