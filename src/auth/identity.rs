//! Caller identity
//!
//! Resolves the account that owns a filesystem path, using the host passwd
//! database for the uid to name mapping.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::error::AuthError;

/// Owner uid of `path`.
pub fn path_owner_uid(path: &Path) -> Result<u32, AuthError> {
    fs::metadata(path)
        .map(|meta| meta.uid())
        .map_err(|e| AuthError::CallerPathUnavailable(path.to_path_buf(), e))
}

/// Account name for `uid` from a passwd(5) formatted file.
pub fn account_name(passwd_path: &Path, uid: u32) -> Result<String, AuthError> {
    let contents = fs::read_to_string(passwd_path)
        .map_err(|e| AuthError::PasswdUnreadable(passwd_path.to_path_buf(), e))?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let mut fields = line.split(':');
            let name = fields.next()?;
            let entry_uid = fields.nth(1)?.parse::<u32>().ok()?;
            (entry_uid == uid && !name.is_empty()).then(|| name.to_string())
        })
        .ok_or(AuthError::UnknownOwner(uid))
}

/// Account name owning `path`.
pub fn path_owner_name(passwd_path: &Path, path: &Path) -> Result<String, AuthError> {
    let uid = path_owner_uid(path)?;
    account_name(passwd_path, uid)
}
