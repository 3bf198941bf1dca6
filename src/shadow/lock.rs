//! Database-wide advisory lock
//!
//! Uses the same convention as the host account tools: an exclusively
//! created `<database>.lock` file holding the owner's pid. Whoever creates
//! the file holds the lock; removing it releases the lock.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::ShadowError;

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Held lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Waits up to `timeout` for the lock at `path`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, ShadowError> {
        let started = Instant::now();

        loop {
            match try_create(path) {
                Ok(()) => {
                    debug!("Acquired lock {}", path.display());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if remove_if_stale(path, timeout) {
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(ShadowError::LockTimeout(path.to_path_buf()));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(ShadowError::LockFailed(path.to_path_buf(), e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        } else {
            debug!("Released lock {}", self.path.display());
        }
    }
}

fn try_create(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    if let Err(e) = write!(file, "{}", std::process::id()) {
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Removes a lock whose owner process no longer exists. A lock without a
/// readable pid is only treated as stale once it is older than `max_age`,
/// since its owner may still be writing the pid.
fn remove_if_stale(path: &Path, max_age: Duration) -> bool {
    let owner = match fs::read_to_string(path) {
        Ok(contents) => contents.trim().parse::<u32>().ok(),
        Err(_) => return false,
    };

    let Some(pid) = owner else {
        let age = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok());
        if age.is_some_and(|age| age >= max_age) {
            warn!("Removing lock {} with no owner pid", path.display());
            return fs::remove_file(path).is_ok();
        }
        return false;
    };

    if pid == std::process::id() || Path::new(&format!("/proc/{}", pid)).exists() {
        return false;
    }

    warn!("Removing stale lock {} left by pid {}", path.display(), pid);
    fs::remove_file(path).is_ok()
}
