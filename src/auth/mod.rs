//! Caller authorization
//!
//! Ties a request to the account it claims to act for.

pub mod identity;
pub mod results;
pub mod validator;

pub use results::{AuthorizationDecision, AuthorizedAs};
pub use validator::Authorizer;
