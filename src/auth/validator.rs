//! Authorization checker
//!
//! A caller may act for a user if the path it presents is owned by that
//! user, or by the administrative account.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::identity::path_owner_name;
use super::results::{AuthorizationDecision, AuthorizedAs};
use crate::error::AuthError;

pub struct Authorizer {
    passwd_path: PathBuf,
    admin_user: String,
}

impl Authorizer {
    pub fn new(passwd_path: impl Into<PathBuf>, admin_user: impl Into<String>) -> Self {
        Self {
            passwd_path: passwd_path.into(),
            admin_user: admin_user.into(),
        }
    }

    /// Decides whether the owner of `caller_path` may act for `claimed_username`.
    pub fn authorize(&self, caller_path: &Path, claimed_username: &str) -> AuthorizationDecision {
        let caller = match path_owner_name(&self.passwd_path, caller_path) {
            Ok(name) => name,
            Err(e) => {
                warn!("Cannot identify caller: {}", e);
                return AuthorizationDecision::Denied(e.to_string());
            }
        };

        if caller == claimed_username {
            debug!("Caller {} acts for itself", caller);
            AuthorizationDecision::Allowed(AuthorizedAs::SelfService)
        } else if caller == self.admin_user {
            debug!("Administrator {} acts for {}", caller, claimed_username);
            AuthorizationDecision::Allowed(AuthorizedAs::Administrator)
        } else {
            AuthorizationDecision::Denied(format!(
                "{} may not act for {}",
                caller, claimed_username
            ))
        }
    }

    /// `authorize` as a `Result`, for use with `?`.
    pub fn require(&self, caller_path: &Path, claimed_username: &str) -> Result<AuthorizedAs, AuthError> {
        match self.authorize(caller_path, claimed_username) {
            AuthorizationDecision::Allowed(how) => Ok(how),
            AuthorizationDecision::Denied(reason) => {
                warn!("Denied request for {}: {}", claimed_username, reason);
                Err(AuthError::InvalidUser(claimed_username.to_string()))
            }
        }
    }
}
