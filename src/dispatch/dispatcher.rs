//! Request dispatcher
//!
//! Runs one request through authorization, lookup and mutation, undoing a
//! half-finished account creation when the password cannot be stored.

use log::{debug, error, info, warn};

use super::state::Stage;
use crate::auth::Authorizer;
use crate::config::ServiceConfig;
use crate::crypt::{MethodResolver, PasswordHasher, SaltGenerator};
use crate::error::handlers::{error_to_result_code, handle_error};
use crate::error::PasswdSrvError;
use crate::protocol::{Operation, Request, ResultCode};
use crate::provision::{CommandProvisioner, Provisioner};
use crate::shadow::ShadowStore;

pub struct Dispatcher {
    store: ShadowStore,
    hasher: PasswordHasher,
    authorizer: Authorizer,
    provisioner: Box<dyn Provisioner>,
}

impl Dispatcher {
    pub fn new(
        store: ShadowStore,
        hasher: PasswordHasher,
        authorizer: Authorizer,
        provisioner: Box<dyn Provisioner>,
    ) -> Self {
        Self {
            store,
            hasher,
            authorizer,
            provisioner,
        }
    }

    /// Wires up the host-backed collaborators described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let store = ShadowStore::new(
            &config.shadow_path,
            &config.shadow_lock_path,
            config.lock_timeout(),
        );
        let hasher = PasswordHasher::new(
            MethodResolver::new(&config.login_defs_path),
            SaltGenerator::new(config.salt_source),
        );
        let authorizer = Authorizer::new(&config.passwd_path, &config.admin_user);
        let provisioner = Box::new(CommandProvisioner::new(config, store.clone()));

        Self::new(store, hasher, authorizer, provisioner)
    }

    /// Re-read the hashing method on the next password write.
    pub fn refresh(&self) {
        self.hasher.refresh();
    }

    /// Processes `request` and reports the caller-visible outcome.
    pub fn dispatch(&self, request: Request) -> ResultCode {
        let op = request.operation.name();
        let username = request.username().to_string();

        match self.process(request) {
            Ok(()) => {
                info!("{} for {} succeeded", op, username);
                ResultCode::Success
            }
            Err(e) => {
                handle_error(&e);
                error_to_result_code(&e)
            }
        }
    }

    pub fn process(&self, request: Request) -> Result<(), PasswdSrvError> {
        trace(&request.operation, Stage::Received);
        request.validate()?;

        let how = self
            .authorizer
            .require(&request.caller_path, request.username())?;
        debug!("{} for {} authorized as {:?}", request.operation.name(), request.username(), how);
        trace(&request.operation, Stage::Authorized);

        match &request.operation {
            Operation::ChangePassword {
                username,
                old_password,
                new_password,
            } => self.change_password(username, old_password, new_password),
            Operation::AddUser {
                username,
                new_password,
            } => self.add_user(username, new_password),
            Operation::DeleteUser { username } => self.delete_user(username),
        }?;

        trace(&request.operation, Stage::Committed);
        Ok(())
    }

    /// Lookup, verification and update share one hold of the store lock.
    fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), PasswdSrvError> {
        let lock = self.store.lock()?;

        let record = lock
            .find(username)?
            .ok_or_else(|| PasswdSrvError::UserNotFound(username.to_string()))?;
        debug!("change-password for {}: {}", username, Stage::Located);

        if !PasswordHasher::verify(old_password, &record.hash) {
            return Err(PasswdSrvError::PasswordMismatch(username.to_string()));
        }

        let hash = self.hasher.hash_new(new_password)?;
        lock.update(username, &hash)?;
        debug!("change-password for {}: {}", username, Stage::Mutated);

        Ok(())
    }

    fn add_user(&self, username: &str, new_password: &str) -> Result<(), PasswdSrvError> {
        if self.store.find(username)?.is_some() {
            return Err(PasswdSrvError::UserExists(username.to_string()));
        }

        self.provisioner
            .provision(username)
            .map_err(PasswdSrvError::UserAddFailed)?;
        debug!("add-user for {}: {}", username, Stage::Located);

        if let Err(e) = self.store_password(username, new_password) {
            warn!("Storing password for new account {} failed; removing it", username);
            if let Err(undo) = self.provisioner.deprovision(username) {
                error!("Could not remove account {} after failed add: {}", username, undo);
            }
            return Err(e);
        }
        debug!("add-user for {}: {}", username, Stage::Mutated);

        Ok(())
    }

    fn store_password(&self, username: &str, new_password: &str) -> Result<(), PasswdSrvError> {
        let hash = self.hasher.hash_new(new_password)?;
        self.store.update(username, &hash)?;
        Ok(())
    }

    fn delete_user(&self, username: &str) -> Result<(), PasswdSrvError> {
        if self.store.find(username)?.is_none() {
            return Err(PasswdSrvError::UserNotFound(username.to_string()));
        }
        debug!("delete-user for {}: {}", username, Stage::Located);

        if let Err(e) = self.provisioner.deprovision(username) {
            warn!("Removing account {} failed: {}", username, e);
            return Err(PasswdSrvError::UserDeleteFailed(username.to_string()));
        }

        if self.store.find(username)?.is_some() {
            warn!("Account {} still present after removal", username);
            return Err(PasswdSrvError::UserDeleteFailed(username.to_string()));
        }
        debug!("delete-user for {}: {}", username, Stage::Mutated);

        Ok(())
    }
}

fn trace(operation: &Operation, stage: Stage) {
    debug!("{} for {}: {}", operation.name(), operation.username(), stage);
}
