use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Wrong auth")]
    WrongAuth,
    #[error("Stored credential is malformed")]
    MalformedHash,
    #[error("Failed to hash credential: {0}")]
    Hashing(String),
}

/// Turns a plaintext secret into a storable hash and checks secrets
/// against it. Only hashes ever reach the database.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String, AuthError>;

    fn verify(&self, secret: &str, stored: &str) -> Result<(), AuthError>;
}

/// Argon2id, stored as a PHC string (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`).
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit cost parameters for new hashes. Existing hashes are
    /// always verified with the parameters recorded in them.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, secret: &str, stored: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(stored).map_err(|_| AuthError::MalformedHash)?;
        match self.argon2().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(password_hash::Error::Password) => Err(AuthError::WrongAuth),
            Err(_) => Err(AuthError::MalformedHash),
        }
    }
}
