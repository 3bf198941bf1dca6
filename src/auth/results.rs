//! Authorization result types
//!
//! Defines the decision returned by the authorization checker.

/// Why a caller may act for the claimed user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizedAs {
    /// The caller is the claimed user
    SelfService,
    /// The caller is the administrative account
    Administrator,
}

/// Outcome of checking a request's caller against the claimed user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allowed(AuthorizedAs),
    Denied(String),
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthorizationDecision::Allowed(_))
    }
}
