//! Request types
//!
//! A request names one operation on one account, plus the path the caller
//! presented to prove who it is.

use std::fmt;
use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::error::RequestError;
use crate::utils::validation::is_valid_field;

pub const OP_CHANGE_PASSWORD: i32 = 1;
pub const OP_ADD_USER: i32 = 2;
pub const OP_DELETE_USER: i32 = 3;

/// The operation requested, with the fields it needs.
pub enum Operation {
    ChangePassword {
        username: String,
        old_password: Zeroizing<String>,
        new_password: Zeroizing<String>,
    },
    AddUser {
        username: String,
        new_password: Zeroizing<String>,
    },
    DeleteUser {
        username: String,
    },
}

impl Operation {
    pub fn username(&self) -> &str {
        match self {
            Operation::ChangePassword { username, .. }
            | Operation::AddUser { username, .. }
            | Operation::DeleteUser { username } => username,
        }
    }

    pub fn opcode(&self) -> i32 {
        match self {
            Operation::ChangePassword { .. } => OP_CHANGE_PASSWORD,
            Operation::AddUser { .. } => OP_ADD_USER,
            Operation::DeleteUser { .. } => OP_DELETE_USER,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ChangePassword { .. } => "change-password",
            Operation::AddUser { .. } => "add-user",
            Operation::DeleteUser { .. } => "delete-user",
        }
    }
}

// Passwords stay out of logs.
impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.name())
            .field("username", &self.username())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Request {
    pub operation: Operation,
    pub caller_path: PathBuf,
}

impl Request {
    pub fn new(operation: Operation, caller_path: impl Into<PathBuf>) -> Self {
        Self {
            operation,
            caller_path: caller_path.into(),
        }
    }

    pub fn change_password(
        username: &str,
        old_password: &str,
        new_password: &str,
        caller_path: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            Operation::ChangePassword {
                username: username.to_string(),
                old_password: Zeroizing::new(old_password.to_string()),
                new_password: Zeroizing::new(new_password.to_string()),
            },
            caller_path,
        )
    }

    pub fn add_user(username: &str, new_password: &str, caller_path: impl Into<PathBuf>) -> Self {
        Self::new(
            Operation::AddUser {
                username: username.to_string(),
                new_password: Zeroizing::new(new_password.to_string()),
            },
            caller_path,
        )
    }

    pub fn delete_user(username: &str, caller_path: impl Into<PathBuf>) -> Self {
        Self::new(
            Operation::DeleteUser {
                username: username.to_string(),
            },
            caller_path,
        )
    }

    pub fn username(&self) -> &str {
        self.operation.username()
    }

    /// Rejects values that cannot be written safely to a colon-delimited
    /// record.
    pub fn validate(&self) -> Result<(), RequestError> {
        let username = self.username();
        if username.is_empty() {
            return Err(RequestError::InvalidParam("empty username".into()));
        }
        if !is_valid_field(username) || username.starts_with('-') {
            return Err(RequestError::InvalidParam(format!(
                "username contains forbidden characters: {:?}",
                username
            )));
        }

        let passwords: Vec<&str> = match &self.operation {
            Operation::ChangePassword {
                old_password,
                new_password,
                ..
            } => vec![old_password.as_str(), new_password.as_str()],
            Operation::AddUser { new_password, .. } => vec![new_password.as_str()],
            Operation::DeleteUser { .. } => vec![],
        };
        if passwords.iter().any(|p| !is_valid_field(p)) {
            return Err(RequestError::InvalidParam(
                "password contains forbidden characters".into(),
            ));
        }

        if self.caller_path.as_os_str().is_empty() {
            return Err(RequestError::InvalidParam("empty caller path".into()));
        }

        Ok(())
    }
}
