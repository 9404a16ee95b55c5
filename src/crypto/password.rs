use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Salted PBKDF2-SHA256 password hash. The iteration count travels with
/// the hash so stored credentials stay verifiable when the default changes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    salt: String,
    hash: String,
    iterations: u32,
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt.
    pub fn new(password: &str, iterations: u32) -> Result<Self, CryptoError> {
        Self::with_salt(password, &generate_salt(), iterations)
    }

    /// Hash `password` with a caller-provided salt.
    pub fn with_salt(
        password: &str,
        salt: &[u8; SALT_LENGTH],
        iterations: u32,
    ) -> Result<Self, CryptoError> {
        if iterations == 0 {
            return Err(CryptoError::InvalidIterations);
        }
        let derived = derive(password, salt, iterations);
        Ok(Self {
            salt: B64.encode(salt),
            hash: B64.encode(&derived[..]),
            iterations,
        })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Constant-time check of `password` against this hash.
    pub fn verify(&self, password: &str) -> bool {
        match self.try_verify(password) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential could not be decoded");
                false
            }
        }
    }

    fn try_verify(&self, password: &str) -> Result<bool, CryptoError> {
        if self.iterations == 0 {
            return Err(CryptoError::InvalidIterations);
        }
        let salt = B64.decode(&self.salt).map_err(|_| CryptoError::CorruptedHash)?;
        let expected = Zeroizing::new(B64.decode(&self.hash).map_err(|_| CryptoError::CorruptedHash)?);
        if expected.len() != HASH_LENGTH {
            return Err(CryptoError::CorruptedHash);
        }
        let derived = derive(password, &salt, self.iterations);
        Ok(derived[..].ct_eq(&expected[..]).into())
    }
}

// Never print the salt or digest.
impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHash")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

/// Derive the PBKDF2-SHA256 digest, zeroed on drop.
fn derive(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut out = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out[..]);
    out
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
