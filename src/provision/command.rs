//! Provisioner backed by useradd/userdel style programs

use std::process::Command;

use log::{error, info};

use super::Provisioner;
use crate::config::ServiceConfig;
use crate::error::ProvisionError;
use crate::shadow::{CredentialRecord, ShadowStore};

pub struct CommandProvisioner {
    useradd: String,
    userdel: String,
    primary_group: String,
    supplementary_groups: String,
    login_shell: String,
    store: ShadowStore,
}

impl CommandProvisioner {
    pub fn new(config: &ServiceConfig, store: ShadowStore) -> Self {
        Self {
            useradd: config.useradd_program.clone(),
            userdel: config.userdel_program.clone(),
            primary_group: config.primary_group.clone(),
            supplementary_groups: config.supplementary_groups.clone(),
            login_shell: config.login_shell.clone(),
            store,
        }
    }

    /// Arguments passed to the account creation program.
    pub fn useradd_args<'a>(&'a self, username: &'a str) -> Vec<&'a str> {
        vec![
            "-g",
            self.primary_group.as_str(),
            "-G",
            self.supplementary_groups.as_str(),
            "-s",
            self.login_shell.as_str(),
            username,
        ]
    }

    fn run(program: &str, args: &[&str]) -> Result<(), ProvisionError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| ProvisionError::SpawnFailed(program.to_string(), e))?;

        if status.success() {
            Ok(())
        } else {
            error!("{} failed with {}", program, status);
            Err(ProvisionError::CommandFailed {
                program: program.to_string(),
                status: status.code(),
            })
        }
    }
}

impl Provisioner for CommandProvisioner {
    fn provision(&self, username: &str) -> Result<CredentialRecord, ProvisionError> {
        Self::run(&self.useradd, &self.useradd_args(username))?;

        // The tool's exit status alone is not trusted; the record must exist.
        let record = self
            .store
            .find(username)?
            .ok_or_else(|| ProvisionError::NotCreated(username.to_string()))?;

        info!("Created account {}", username);
        Ok(record)
    }

    fn deprovision(&self, username: &str) -> Result<(), ProvisionError> {
        Self::run(&self.userdel, &[username])?;
        info!("Removed account {}", username);
        Ok(())
    }
}
