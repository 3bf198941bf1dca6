//! Error handlers
//!
//! Maps server errors onto the result codes returned to callers.

use crate::error::types::{PasswdSrvError, RequestError, ShadowError};
use crate::protocol::ResultCode;
use log::{error, warn};

/// Log a failed request
pub fn handle_error(err: &PasswdSrvError) {
    match err {
        PasswdSrvError::Shadow(e) if e.is_fatal() => error!("Password server error: {}", err),
        PasswdSrvError::SendFailed(_) => error!("Password server error: {}", err),
        _ => warn!("Request failed: {}", err),
    }
}

/// Convert error to the caller-visible result code
pub fn error_to_result_code(err: &PasswdSrvError) -> ResultCode {
    match err {
        PasswdSrvError::Request(RequestError::InvalidOpcode(_)) => ResultCode::InvalidOpcode,
        PasswdSrvError::Request(_) => ResultCode::InvalidParam,
        PasswdSrvError::Auth(_) => ResultCode::InvalidUser,
        PasswdSrvError::Shadow(e) if e.is_fatal() => ResultCode::Fatal,
        PasswdSrvError::Shadow(ShadowError::ReadFailed(_)) => ResultCode::ShadowFileError,
        PasswdSrvError::Shadow(_) => ResultCode::PasswordUpdateFailed,
        PasswdSrvError::Crypt(_) => ResultCode::PasswordUpdateFailed,
        PasswdSrvError::UserNotFound(_) => ResultCode::UserNotFound,
        PasswdSrvError::UserExists(_) => ResultCode::UserExists,
        PasswdSrvError::PasswordMismatch(_) => ResultCode::PasswordMismatch,
        PasswdSrvError::UserAddFailed(_) => ResultCode::UserAddFailed,
        PasswdSrvError::UserDeleteFailed(_) => ResultCode::UserDeleteFailed,
        PasswdSrvError::SendFailed(_) => ResultCode::SendFailed,
    }
}
