//! Salt generation
//!
//! Produces crypt(3)-style salts from the radix-64 alphabet. The default
//! source is a pseudo-random generator seeded from the clock, following the
//! host crypt convention; the `os` source draws from the operating system
//! CSPRNG instead.

use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::error::CryptError;

pub const MIN_SALT_SIZE: usize = 8;
pub const MAX_SALT_SIZE: usize = 16;

/// Salt length used by DES and MD5
pub const DEFAULT_SALT_SIZE: usize = 8;

const RADIX64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Where salt randomness comes from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaltSource {
    #[default]
    Seeded,
    Os,
}

pub struct SaltGenerator {
    source: SaltSource,
    rng: Box<dyn RngCore + Send>,
}

impl SaltGenerator {
    pub fn new(source: SaltSource) -> Self {
        let rng: Box<dyn RngCore + Send> = match source {
            SaltSource::Seeded => Box::new(StdRng::seed_from_u64(clock_seed())),
            SaltSource::Os => Box::new(OsRng),
        };
        Self { source, rng }
    }

    /// Generator with a fixed seed, for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            source: SaltSource::Seeded,
            rng: Box::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn source(&self) -> SaltSource {
        self.source
    }

    /// Re-seed before producing the salt of a new credential.
    pub fn reseed(&mut self) {
        if self.source == SaltSource::Seeded {
            self.rng = Box::new(StdRng::seed_from_u64(clock_seed()));
            debug!("Salt generator re-seeded");
        }
    }

    /// Returns a salt of exactly `length` radix-64 characters.
    pub fn generate_salt(&mut self, length: usize) -> Result<Zeroizing<String>, CryptError> {
        if !(MIN_SALT_SIZE..=MAX_SALT_SIZE).contains(&length) {
            return Err(CryptError::InvalidSaltLength(length));
        }

        let mut salt = Zeroizing::new(String::with_capacity(MAX_SALT_SIZE + 6));
        loop {
            // random() yields 31 bits
            let value = self.rng.next_u32() & 0x7fff_ffff;
            push_l64a(&mut salt, value);
            if salt.len() >= length {
                break;
            }
        }
        salt.truncate(length);

        Ok(salt)
    }

    /// Salt length for the SHA crypt methods, uniform over 8..=16.
    pub fn random_sha_salt_length(&mut self) -> usize {
        self.rng.gen_range(MIN_SALT_SIZE..=MAX_SALT_SIZE)
    }

    /// Uniform pick from an inclusive range, used for SHA rounds.
    pub fn pick_in_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Appends the l64a(3) encoding of `value`, least significant digit first.
fn push_l64a(out: &mut String, mut value: u32) {
    while value != 0 {
        out.push(RADIX64[(value & 0x3f) as usize] as char);
        value >>= 6;
    }
}

fn clock_seed() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs() ^ u64::from(now.subsec_micros()) ^ u64::from(std::process::id())
}
