//! Password hashing
//!
//! Combines the hash-method resolver and the salt generator into the
//! crypt(3)-compatible hashing used for stored credentials.

pub mod method;
pub mod salt;

use std::sync::Mutex;

use log::debug;
use zeroize::Zeroizing;

use crate::error::CryptError;

pub use method::{HashMethod, MethodResolver, MethodSettings};
pub use salt::{SaltGenerator, SaltSource};

/// Hashes new passwords and checks old ones.
pub struct PasswordHasher {
    resolver: MethodResolver,
    salts: Mutex<SaltGenerator>,
}

impl PasswordHasher {
    pub fn new(resolver: MethodResolver, salts: SaltGenerator) -> Self {
        Self {
            resolver,
            salts: Mutex::new(salts),
        }
    }

    /// Forget the cached hashing method.
    pub fn refresh(&self) {
        self.resolver.refresh();
    }

    /// Builds a fresh crypt setting: method tag, optional rounds, salt.
    pub fn new_setting(&self) -> Result<(HashMethod, Zeroizing<String>), CryptError> {
        let settings = self.resolver.settings()?;
        let method = settings.method;

        let mut salts = self.salts.lock().unwrap_or_else(|e| e.into_inner());
        salts.reseed();

        let mut setting = Zeroizing::new(String::from(method.tag()));
        let salt_len = if method.has_variable_salt() {
            if let Some((min, max)) = settings.sha_rounds {
                setting.push_str(&format!("rounds={}$", salts.pick_in_range(min, max)));
            }
            salts.random_sha_salt_length()
        } else {
            salt::DEFAULT_SALT_SIZE
        };

        let salt = salts.generate_salt(salt_len)?;
        match method {
            // Traditional crypt only reads two salt characters
            HashMethod::Des => setting.push_str(&salt[..2]),
            _ => setting.push_str(&salt),
        }

        Ok((method, setting))
    }

    /// Hash `password` for storage with the host's configured method.
    pub fn hash_new(&self, password: &str) -> Result<Zeroizing<String>, CryptError> {
        let (method, setting) = self.new_setting()?;
        let hash = match method {
            HashMethod::Des => pwhash::unix_crypt::hash_with(setting.as_str(), password)?,
            HashMethod::Md5 => pwhash::md5_crypt::hash_with(setting.as_str(), password)?,
            HashMethod::Sha256 => pwhash::sha256_crypt::hash_with(setting.as_str(), password)?,
            HashMethod::Sha512 => pwhash::sha512_crypt::hash_with(setting.as_str(), password)?,
        };
        debug!("Generated new {} password hash", method.name());
        Ok(Zeroizing::new(hash))
    }

    /// Re-hashes `password` with the setting embedded in `stored` and
    /// compares the full strings.
    pub fn verify(password: &str, stored: &str) -> bool {
        match pwhash::unix::crypt(password, stored) {
            Ok(candidate) => {
                let candidate = Zeroizing::new(candidate);
                candidate.as_str() == stored
            }
            Err(_) => false,
        }
    }
}
