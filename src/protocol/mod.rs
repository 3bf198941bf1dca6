//! Password server protocol
//!
//! Request types, the request frame codec and result codes.

pub mod codec;
pub mod request;
pub mod responses;

pub use codec::{FRAME_SIZE, decode_request, encode_request};
pub use request::{Operation, Request};
pub use responses::ResultCode;
