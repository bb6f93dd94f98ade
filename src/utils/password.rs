//! One-way password hashing with Argon2id.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Argon2id hasher with a configured time cost
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("time_cost", &self.params.t_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// Build a hasher whose time cost is `cost` iterations
    pub fn new(cost: u32) -> anyhow::Result<Self> {
        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .map_err(|e| anyhow!("invalid password hash cost {}: {}", cost, e))?;
        Ok(Self { params })
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("failed to hash password: {}", e))
    }
}
