//! Envelope types exchanged between client and server
//!
//! Every envelope is a plain struct whose first field is its header. The
//! codec relies on that layout to read the header out of a datagram before
//! deciding which concrete envelope to decode.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Operation requested by an envelope
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCode {
    Login,
    Shutdown,
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCode::Login => write!(f, "ACTION_LOGIN"),
            ActionCode::Shutdown => write!(f, "ACTION_SHUTDOWN"),
        }
    }
}

/// Opaque session token issued by the server on login
///
/// An empty id means the sender holds no session yet.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh random session id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Common prefix of every request envelope
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub action: ActionCode,
    pub session_id: SessionId,
}

impl RequestHeader {
    pub fn new(action: ActionCode) -> Self {
        Self {
            action,
            session_id: SessionId::default(),
        }
    }
}

/// Common prefix of every response envelope
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub action: ActionCode,
    pub session_id: SessionId,
    pub is_ok: bool,
    pub error: String,
}

impl ResponseHeader {
    pub fn ok(action: ActionCode, session_id: SessionId) -> Self {
        Self {
            action,
            session_id,
            is_ok: true,
            error: String::new(),
        }
    }

    pub fn failed(action: ActionCode, session_id: SessionId, error: impl Into<String>) -> Self {
        Self {
            action,
            session_id,
            is_ok: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub header: RequestHeader,
    pub account: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(account: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            header: RequestHeader::new(ActionCode::Login),
            account: account.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub header: ResponseHeader,
    pub welcome: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ShutdownRequest {
    pub header: RequestHeader,
}

impl ShutdownRequest {
    pub fn new() -> Self {
        Self {
            header: RequestHeader::new(ActionCode::Shutdown),
        }
    }
}

impl Default for ShutdownRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ShutdownResponse {
    pub header: ResponseHeader,
}

/// Any request envelope the server understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login(LoginRequest),
    Shutdown(ShutdownRequest),
}

impl Request {
    pub fn header(&self) -> &RequestHeader {
        match self {
            Request::Login(ask) => &ask.header,
            Request::Shutdown(ask) => &ask.header,
        }
    }

    pub fn action(&self) -> ActionCode {
        self.header().action
    }

    pub fn session_id(&self) -> &SessionId {
        &self.header().session_id
    }

    pub fn set_session_id(&mut self, session_id: SessionId) {
        match self {
            Request::Login(ask) => ask.header.session_id = session_id,
            Request::Shutdown(ask) => ask.header.session_id = session_id,
        }
    }
}

impl From<LoginRequest> for Request {
    fn from(ask: LoginRequest) -> Self {
        Request::Login(ask)
    }
}

impl From<ShutdownRequest> for Request {
    fn from(ask: ShutdownRequest) -> Self {
        Request::Shutdown(ask)
    }
}

/// Any response envelope the server sends
///
/// `Error` carries only a header and is used for every rejected request,
/// whatever its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Login(LoginResponse),
    Shutdown(ShutdownResponse),
    Error(ResponseHeader),
}

impl Response {
    pub fn header(&self) -> &ResponseHeader {
        match self {
            Response::Login(ack) => &ack.header,
            Response::Shutdown(ack) => &ack.header,
            Response::Error(header) => header,
        }
    }

    pub fn action(&self) -> ActionCode {
        self.header().action
    }

    pub fn session_id(&self) -> &SessionId {
        &self.header().session_id
    }

    pub fn is_ok(&self) -> bool {
        self.header().is_ok
    }
}
