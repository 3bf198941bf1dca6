//! Result codes
//!
//! Defines the integer result codes reported back to the caller.

use std::fmt;

/// Outcome of a request as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Fatal,
    UserNotFound,
    PasswordMismatch,
    ShadowFileError,
    InvalidParam,
    /// Kept for wire compatibility; allocation failure aborts instead.
    InsufficientMemory,
    InvalidOpcode,
    InvalidUser,
    PasswordUpdateFailed,
    SendFailed,
    UserExists,
    UserAddFailed,
    UserDeleteFailed,
}

impl ResultCode {
    pub fn code(self) -> i32 {
        match self {
            ResultCode::Fatal => -1,
            ResultCode::Success => 0,
            ResultCode::UserNotFound => 1,
            ResultCode::PasswordMismatch => 2,
            ResultCode::ShadowFileError => 3,
            ResultCode::InvalidParam => 4,
            ResultCode::InsufficientMemory => 5,
            ResultCode::InvalidOpcode => 6,
            ResultCode::InvalidUser => 7,
            ResultCode::PasswordUpdateFailed => 8,
            ResultCode::SendFailed => 9,
            ResultCode::UserExists => 10,
            ResultCode::UserAddFailed => 11,
            ResultCode::UserDeleteFailed => 12,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let result = match code {
            -1 => ResultCode::Fatal,
            0 => ResultCode::Success,
            1 => ResultCode::UserNotFound,
            2 => ResultCode::PasswordMismatch,
            3 => ResultCode::ShadowFileError,
            4 => ResultCode::InvalidParam,
            5 => ResultCode::InsufficientMemory,
            6 => ResultCode::InvalidOpcode,
            7 => ResultCode::InvalidUser,
            8 => ResultCode::PasswordUpdateFailed,
            9 => ResultCode::SendFailed,
            10 => ResultCode::UserExists,
            11 => ResultCode::UserAddFailed,
            12 => ResultCode::UserDeleteFailed,
            _ => return None,
        };
        Some(result)
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }

    /// Encode as the reply written back on the socket
    pub fn to_bytes(self) -> [u8; 4] {
        self.code().to_ne_bytes()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}
