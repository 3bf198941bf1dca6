//! Error types
//!
//! Defines domain-specific error types for each module of the password server.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Request decoding and parameter errors
#[derive(Debug)]
pub enum RequestError {
    InvalidOpcode(i32),
    InvalidParam(String),
    MalformedFrame(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidOpcode(op) => write!(f, "Invalid op code: {}", op),
            RequestError::InvalidParam(s) => write!(f, "Invalid parameter: {}", s),
            RequestError::MalformedFrame(s) => write!(f, "Malformed request frame: {}", s),
        }
    }
}

impl std::error::Error for RequestError {}

/// Authorization module errors
#[derive(Debug)]
pub enum AuthError {
    InvalidUser(String),
    CallerPathUnavailable(PathBuf, io::Error),
    UnknownOwner(u32),
    PasswdUnreadable(PathBuf, io::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidUser(u) => write!(f, "Caller may not act for user: {}", u),
            AuthError::CallerPathUnavailable(p, e) => {
                write!(f, "Cannot stat caller path {}: {}", p.display(), e)
            }
            AuthError::UnknownOwner(uid) => write!(f, "No account for uid {}", uid),
            AuthError::PasswdUnreadable(p, e) => {
                write!(f, "Cannot read passwd database {}: {}", p.display(), e)
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Shadow store errors
#[derive(Debug)]
pub enum ShadowError {
    LockFailed(PathBuf, io::Error),
    LockTimeout(PathBuf),
    OpenFailed(PathBuf, io::Error),
    ReadFailed(io::Error),
    WriteFailed(io::Error),
    RecordNotFound(String),
}

impl ShadowError {
    /// Lock and open failures leave nothing half-done and abort the request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShadowError::LockFailed(..) | ShadowError::LockTimeout(_) | ShadowError::OpenFailed(..)
        )
    }
}

impl fmt::Display for ShadowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowError::LockFailed(p, e) => write!(f, "Failed to lock {}: {}", p.display(), e),
            ShadowError::LockTimeout(p) => write!(f, "Timed out waiting for lock {}", p.display()),
            ShadowError::OpenFailed(p, e) => write!(f, "Failed to open {}: {}", p.display(), e),
            ShadowError::ReadFailed(e) => write!(f, "Failed to read shadow database: {}", e),
            ShadowError::WriteFailed(e) => write!(f, "Failed to write shadow database: {}", e),
            ShadowError::RecordNotFound(u) => write!(f, "No shadow record for user: {}", u),
        }
    }
}

impl std::error::Error for ShadowError {}

/// Salt and hash generation errors
#[derive(Debug)]
pub enum CryptError {
    InvalidSaltLength(usize),
    UnsupportedMethod(String),
    HashFailed(String),
}

impl fmt::Display for CryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptError::InvalidSaltLength(n) => {
                write!(f, "Invalid salt length {}: must be between 8 and 16", n)
            }
            CryptError::UnsupportedMethod(m) => write!(f, "Unsupported ENCRYPT_METHOD: {}", m),
            CryptError::HashFailed(s) => write!(f, "Hashing failed: {}", s),
        }
    }
}

impl std::error::Error for CryptError {}

impl From<pwhash::error::Error> for CryptError {
    fn from(error: pwhash::error::Error) -> Self {
        CryptError::HashFailed(error.to_string())
    }
}

/// External account tool errors
#[derive(Debug)]
pub enum ProvisionError {
    SpawnFailed(String, io::Error),
    CommandFailed { program: String, status: Option<i32> },
    NotCreated(String),
    Store(ShadowError),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::SpawnFailed(p, e) => write!(f, "Failed to run {}: {}", p, e),
            ProvisionError::CommandFailed { program, status } => match status {
                Some(code) => write!(f, "{} exited with status {}", program, code),
                None => write!(f, "{} terminated by signal", program),
            },
            ProvisionError::NotCreated(u) => write!(f, "Account was not created: {}", u),
            ProvisionError::Store(e) => write!(f, "Cannot confirm account: {}", e),
        }
    }
}

impl std::error::Error for ProvisionError {}

impl From<ShadowError> for ProvisionError {
    fn from(error: ShadowError) -> Self {
        ProvisionError::Store(error)
    }
}

/// General password server error that encompasses all error types
#[derive(Debug)]
pub enum PasswdSrvError {
    Request(RequestError),
    Auth(AuthError),
    Shadow(ShadowError),
    Crypt(CryptError),
    UserNotFound(String),
    UserExists(String),
    PasswordMismatch(String),
    UserAddFailed(ProvisionError),
    UserDeleteFailed(String),
    SendFailed(io::Error),
}

impl fmt::Display for PasswdSrvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswdSrvError::Request(e) => write!(f, "Request error: {}", e),
            PasswdSrvError::Auth(e) => write!(f, "Authorization error: {}", e),
            PasswdSrvError::Shadow(e) => write!(f, "Shadow error: {}", e),
            PasswdSrvError::Crypt(e) => write!(f, "Crypt error: {}", e),
            PasswdSrvError::UserNotFound(u) => write!(f, "User not found: {}", u),
            PasswdSrvError::UserExists(u) => write!(f, "User already exists: {}", u),
            PasswdSrvError::PasswordMismatch(u) => write!(f, "Old password mismatch for user: {}", u),
            PasswdSrvError::UserAddFailed(e) => write!(f, "Failed to add user: {}", e),
            PasswdSrvError::UserDeleteFailed(u) => write!(f, "Failed to delete user: {}", u),
            PasswdSrvError::SendFailed(e) => write!(f, "Failed to send reply: {}", e),
        }
    }
}

impl std::error::Error for PasswdSrvError {}

impl From<RequestError> for PasswdSrvError {
    fn from(error: RequestError) -> Self {
        PasswdSrvError::Request(error)
    }
}

impl From<AuthError> for PasswdSrvError {
    fn from(error: AuthError) -> Self {
        PasswdSrvError::Auth(error)
    }
}

impl From<ShadowError> for PasswdSrvError {
    fn from(error: ShadowError) -> Self {
        PasswdSrvError::Shadow(error)
    }
}

impl From<CryptError> for PasswdSrvError {
    fn from(error: CryptError) -> Self {
        PasswdSrvError::Crypt(error)
    }
}
