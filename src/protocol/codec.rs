//! Request frame codec
//!
//! A request is one fixed-size frame: a native-endian i32 op code followed
//! by NUL-padded username, old password, new password and caller path
//! fields. The reply is a single native-endian i32 result code.

use zeroize::Zeroizing;

use super::request::{OP_ADD_USER, OP_CHANGE_PASSWORD, OP_DELETE_USER, Operation, Request};
use crate::error::RequestError;

pub const OPCODE_SIZE: usize = 4;
pub const USERNAME_SIZE: usize = 50;
pub const PASSWORD_SIZE: usize = 50;
pub const PATH_SIZE: usize = 108;

pub const FRAME_SIZE: usize = OPCODE_SIZE + USERNAME_SIZE + 2 * PASSWORD_SIZE + PATH_SIZE;

/// Decodes a full request frame.
pub fn decode_request(frame: &[u8]) -> Result<Request, RequestError> {
    if frame.len() != FRAME_SIZE {
        return Err(RequestError::MalformedFrame(format!(
            "expected {} bytes, got {}",
            FRAME_SIZE,
            frame.len()
        )));
    }

    let mut opcode = [0u8; OPCODE_SIZE];
    opcode.copy_from_slice(&frame[..OPCODE_SIZE]);
    let opcode = i32::from_ne_bytes(opcode);
    if !matches!(opcode, OP_CHANGE_PASSWORD | OP_ADD_USER | OP_DELETE_USER) {
        return Err(RequestError::InvalidOpcode(opcode));
    }

    let mut cursor = OPCODE_SIZE;
    let mut next_field = |size: usize, name: &str| {
        let field = &frame[cursor..cursor + size];
        cursor += size;
        read_field(field, name)
    };

    let username = next_field(USERNAME_SIZE, "username")?;
    let old_password = Zeroizing::new(next_field(PASSWORD_SIZE, "old password")?);
    let new_password = Zeroizing::new(next_field(PASSWORD_SIZE, "new password")?);
    let caller_path = next_field(PATH_SIZE, "caller path")?;

    let operation = match opcode {
        OP_CHANGE_PASSWORD => Operation::ChangePassword {
            username,
            old_password,
            new_password,
        },
        OP_ADD_USER => Operation::AddUser {
            username,
            new_password,
        },
        OP_DELETE_USER => Operation::DeleteUser { username },
        other => return Err(RequestError::InvalidOpcode(other)),
    };

    Ok(Request::new(operation, caller_path))
}

/// Encodes a request into a frame, as a client would send it.
pub fn encode_request(request: &Request) -> Result<Zeroizing<Vec<u8>>, RequestError> {
    let (old_password, new_password) = match &request.operation {
        Operation::ChangePassword {
            old_password,
            new_password,
            ..
        } => (old_password.as_str(), new_password.as_str()),
        Operation::AddUser { new_password, .. } => ("", new_password.as_str()),
        Operation::DeleteUser { .. } => ("", ""),
    };
    let caller_path = request.caller_path.to_str().ok_or_else(|| {
        RequestError::InvalidParam("caller path is not valid UTF-8".into())
    })?;

    let mut frame = Zeroizing::new(Vec::with_capacity(FRAME_SIZE));
    frame.extend_from_slice(&request.operation.opcode().to_ne_bytes());
    write_field(&mut frame, request.username(), USERNAME_SIZE, "username")?;
    write_field(&mut frame, old_password, PASSWORD_SIZE, "old password")?;
    write_field(&mut frame, new_password, PASSWORD_SIZE, "new password")?;
    write_field(&mut frame, caller_path, PATH_SIZE, "caller path")?;

    Ok(frame)
}

/// Decodes a reply frame.
pub fn decode_reply(reply: [u8; 4]) -> i32 {
    i32::from_ne_bytes(reply)
}

fn read_field(field: &[u8], name: &str) -> Result<String, RequestError> {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| RequestError::MalformedFrame(format!("{} is not NUL-terminated", name)))?;

    String::from_utf8(field[..end].to_vec())
        .map_err(|_| RequestError::InvalidParam(format!("{} is not valid UTF-8", name)))
}

fn write_field(frame: &mut Vec<u8>, value: &str, size: usize, name: &str) -> Result<(), RequestError> {
    // room for the terminating NUL
    if value.len() >= size {
        return Err(RequestError::InvalidParam(format!(
            "{} longer than {} bytes",
            name,
            size - 1
        )));
    }
    frame.extend_from_slice(value.as_bytes());
    frame.resize(frame.len() + size - value.len(), 0);
    Ok(())
}
