//! Hash-method resolution
//!
//! Reads the host login definitions to find which crypt method new passwords
//! are hashed with. The result is cached until `refresh()` is called.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info, warn};

use crate::error::CryptError;

pub const MIN_SHA_ROUNDS: u32 = 1_000;
pub const MAX_SHA_ROUNDS: u32 = 999_999_999;

/// crypt(3) hashing schemes this server can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMethod {
    Des,
    Md5,
    Sha256,
    Sha512,
}

impl HashMethod {
    /// Parses a login.defs method name. Names are matched exactly.
    pub fn from_name(name: &str) -> Result<Self, CryptError> {
        match name {
            "DES" => Ok(HashMethod::Des),
            "MD5" => Ok(HashMethod::Md5),
            "SHA256" => Ok(HashMethod::Sha256),
            "SHA512" => Ok(HashMethod::Sha512),
            other => Err(CryptError::UnsupportedMethod(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashMethod::Des => "DES",
            HashMethod::Md5 => "MD5",
            HashMethod::Sha256 => "SHA256",
            HashMethod::Sha512 => "SHA512",
        }
    }

    /// Prefix identifying the method inside a stored hash.
    pub fn tag(self) -> &'static str {
        match self {
            HashMethod::Des => "",
            HashMethod::Md5 => "$1$",
            HashMethod::Sha256 => "$5$",
            HashMethod::Sha512 => "$6$",
        }
    }

    /// Whether the salt length is drawn at random rather than fixed.
    pub fn has_variable_salt(self) -> bool {
        matches!(self, HashMethod::Sha256 | HashMethod::Sha512)
    }
}

/// Method plus the optional SHA rounds range, as read from login.defs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSettings {
    pub method: HashMethod,
    pub sha_rounds: Option<(u32, u32)>,
}

/// Owns the cached hashing method for the lifetime of the server.
pub struct MethodResolver {
    login_defs: PathBuf,
    cached: Mutex<Option<MethodSettings>>,
}

impl MethodResolver {
    pub fn new(login_defs: impl Into<PathBuf>) -> Self {
        Self {
            login_defs: login_defs.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn resolve(&self) -> Result<HashMethod, CryptError> {
        Ok(self.settings()?.method)
    }

    /// Resolves once, then serves the cached value.
    pub fn settings(&self) -> Result<MethodSettings, CryptError> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(settings) = *cached {
            return Ok(settings);
        }

        let settings = read_settings(&self.login_defs)?;
        info!(
            "Resolved password hashing method {} from {}",
            settings.method.name(),
            self.login_defs.display()
        );
        *cached = Some(settings);
        Ok(settings)
    }

    /// Drops the cached method so the next call re-reads login.defs.
    pub fn refresh(&self) {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        *cached = None;
        debug!("Hashing method cache cleared");
    }
}

fn read_settings(path: &Path) -> Result<MethodSettings, CryptError> {
    let defs = match LoginDefs::load(path) {
        Ok(defs) => defs,
        Err(e) => {
            // No readable file behaves like a file without either key.
            warn!(
                "Cannot read {}: {}; falling back to DES hashing",
                path.display(),
                e
            );
            LoginDefs::default()
        }
    };

    let method = match defs.get("ENCRYPT_METHOD") {
        Some(name) => HashMethod::from_name(name)?,
        None => match defs.get("MD5_CRYPT_ENAB") {
            Some(value) if value != "no" => HashMethod::Md5,
            _ => HashMethod::Des,
        },
    };

    if method == HashMethod::Des {
        warn!("Password hashing resolved to DES");
    }

    let sha_rounds = if method.has_variable_salt() {
        defs.sha_rounds()
    } else {
        None
    };

    Ok(MethodSettings { method, sha_rounds })
}

/// `KEY value` pairs from a login.defs style file
#[derive(Debug, Default)]
struct LoginDefs {
    entries: Vec<(String, String)>,
}

impl LoginDefs {
    fn load(path: &Path) -> std::io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();

        // Bytes that are not UTF-8 (usually in comments) must not hide the
        // keys on other lines.
        for line in reader.split(b'\n') {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                entries.push((key.to_string(), value.to_string()));
            }
        }

        Ok(Self { entries })
    }

    /// First value for `key`
    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_u32(&self, key: &str) -> Option<u32> {
        let value = self.get(key)?;
        match value.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("Ignoring non-numeric {} value: {}", key, value);
                None
            }
        }
    }

    fn sha_rounds(&self) -> Option<(u32, u32)> {
        let clamp = |n: u32| n.clamp(MIN_SHA_ROUNDS, MAX_SHA_ROUNDS);
        match (
            self.get_u32("SHA_CRYPT_MIN_ROUNDS"),
            self.get_u32("SHA_CRYPT_MAX_ROUNDS"),
        ) {
            (Some(min), Some(max)) if min <= max => Some((clamp(min), clamp(max))),
            (Some(min), Some(_)) => Some((clamp(min), clamp(min))),
            (Some(n), None) | (None, Some(n)) => Some((clamp(n), clamp(n))),
            (None, None) => None,
        }
    }
}
