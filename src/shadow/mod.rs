//! Shadow password database
//!
//! Locked lookup and in-place update of the colon-delimited credential file.

pub mod lock;
pub mod record;
pub mod store;

pub use record::CredentialRecord;
pub use store::{ShadowLock, ShadowStore};
