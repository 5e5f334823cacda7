use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand_core::OsRng;
use tracing::warn;

/// Argon2id hashing context, configured once and handed to the app state.
#[derive(Clone)]
pub struct PasswordHashing {
    argon2: Argon2<'static>,
}

impl PasswordHashing {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Memory cost in KiB, iteration count and parallelism.
    pub fn with_costs(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow!("Invalid Argon2 parameters: {}", e))?;
        Ok(Self::new(params))
    }

    /// Hash with a fresh random salt into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    /// False on mismatch and on a stored hash that does not parse.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one hash worth of work on a login for an unknown email, so it
    /// costs about as much as a wrong password. Always false.
    pub fn reject_unknown(&self, password: &str) -> bool {
        if let Err(e) = self.hash(password) {
            warn!("Dummy hash failed: {}", e);
        }
        false
    }
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHashing {
        PasswordHashing::with_costs(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hashing = cheap();
        let hash = hashing.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert!(hashing.verify("correct horse", &hash));
        assert!(!hashing.verify("battery staple", &hash));
    }

    #[test]
    fn salts_differ() {
        let hashing = cheap();
        assert_ne!(hashing.hash("same").unwrap(), hashing.hash("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!cheap().verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn unknown_account_never_verifies() {
        let hashing = cheap();
        assert!(!hashing.reject_unknown("hunter22"));
        assert!(!hashing.reject_unknown(""));
    }

    #[test]
    fn rejects_invalid_costs() {
        assert!(PasswordHashing::with_costs(0, 0, 0).is_err());
    }
}
