//! Datagram encoding and two-phase decoding of envelopes
//!
//! Decoding reads the header first to learn the action, then decodes the
//! whole datagram again as the concrete envelope for that action. bincode's
//! default options tolerate trailing bytes, so the header decodes cleanly
//! from the prefix of any full envelope.

use crate::error::ProtocolError;
use crate::protocol::{
    ActionCode, LoginRequest, LoginResponse, Request, RequestHeader, Response, ResponseHeader,
    ShutdownRequest, ShutdownResponse,
};
use bincode::{deserialize, serialize};
use serde::Serialize;

/// Largest datagram either side will send or accept
pub const PACKAGE_LIMIT: usize = 1024 * 60;

fn encode_envelope<T: Serialize>(envelope: &T) -> Result<Vec<u8>, ProtocolError> {
    let data = serialize(envelope)?;
    if data.len() > PACKAGE_LIMIT {
        return Err(ProtocolError::PackageTooLarge {
            size: data.len(),
            limit: PACKAGE_LIMIT,
        });
    }
    Ok(data)
}

pub fn encode_request(request: &Request) -> Result<Vec<u8>, ProtocolError> {
    match request {
        Request::Login(ask) => encode_envelope(ask),
        Request::Shutdown(ask) => encode_envelope(ask),
    }
}

pub fn encode_response(response: &Response) -> Result<Vec<u8>, ProtocolError> {
    match response {
        Response::Login(ack) => encode_envelope(ack),
        Response::Shutdown(ack) => encode_envelope(ack),
        Response::Error(header) => encode_envelope(header),
    }
}

/// Decodes only the request header of a datagram
pub fn decode_request_header(data: &[u8]) -> Result<RequestHeader, ProtocolError> {
    Ok(deserialize::<RequestHeader>(data)?)
}

/// Decodes only the response header of a datagram
pub fn decode_response_header(data: &[u8]) -> Result<ResponseHeader, ProtocolError> {
    Ok(deserialize::<ResponseHeader>(data)?)
}

pub fn decode_request(data: &[u8]) -> Result<Request, ProtocolError> {
    let header = decode_request_header(data)?;

    let request = match header.action {
        ActionCode::Login => Request::Login(deserialize::<LoginRequest>(data)?),
        ActionCode::Shutdown => Request::Shutdown(deserialize::<ShutdownRequest>(data)?),
    };

    Ok(request)
}

/// Decodes a response to a request that was sent with `expected` action
///
/// A response whose header reports failure is returned as
/// `Response::Error` without decoding any body.
pub fn decode_response(data: &[u8], expected: ActionCode) -> Result<Response, ProtocolError> {
    let header = decode_response_header(data)?;

    if header.action != expected {
        return Err(ProtocolError::UnexpectedAction {
            expected,
            actual: header.action,
        });
    }

    if !header.is_ok {
        return Ok(Response::Error(header));
    }

    let response = match header.action {
        ActionCode::Login => Response::Login(deserialize::<LoginResponse>(data)?),
        ActionCode::Shutdown => Response::Shutdown(deserialize::<ShutdownResponse>(data)?),
    };

    Ok(response)
}
