//! Wire protocol shared by the server and client crates
//!
//! One envelope travels per UDP datagram. Envelopes are bincode-encoded
//! structs that start with a header (action code and session id); the body
//! fields that follow depend on the action.

pub mod codec;
pub mod error;
pub mod protocol;

pub use codec::{
    decode_request, decode_request_header, decode_response, decode_response_header,
    encode_request, encode_response, PACKAGE_LIMIT,
};
pub use error::ProtocolError;
pub use protocol::{
    ActionCode, LoginRequest, LoginResponse, Request, RequestHeader, Response, ResponseHeader,
    SessionId, ShutdownRequest, ShutdownResponse,
};
