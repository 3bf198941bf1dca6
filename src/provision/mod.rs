//! Account provisioning
//!
//! Creating and removing accounts is left to the host's account tools. The
//! dispatcher only sees the [`Provisioner`] trait, so tests can swap in a fake.

pub mod command;

use crate::error::ProvisionError;
use crate::shadow::CredentialRecord;

pub use command::CommandProvisioner;

/// Creates and removes OS accounts. Neither operation is transactional.
pub trait Provisioner: Send + Sync {
    /// Creates the account and returns its freshly written shadow record.
    fn provision(&self, username: &str) -> Result<CredentialRecord, ProvisionError>;

    /// Removes the account.
    fn deprovision(&self, username: &str) -> Result<(), ProvisionError>;
}
