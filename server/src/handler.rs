//! Business logic for a single decoded request

use crate::error::ServerError;
use crate::session::SessionTable;
use log::info;
use shared::{
    ActionCode, LoginRequest, LoginResponse, Request, Response, ResponseHeader, SessionId,
    ShutdownRequest, ShutdownResponse,
};
use std::net::SocketAddr;

pub const INVALID_SESSION_ID: &str = "invalid session id";

/// A decoded request travelling through one handler task
#[derive(Debug, Clone)]
pub struct InFlightRequest {
    pub addr: SocketAddr,
    /// Action read from the header during decoding
    pub action: ActionCode,
    pub request: Request,
    /// Session the response is issued for; login replaces it with a new id
    pub session_id: SessionId,
}

impl InFlightRequest {
    pub fn new(addr: SocketAddr, request: Request) -> Self {
        Self {
            addr,
            action: request.action(),
            session_id: request.session_id().clone(),
            request,
        }
    }
}

/// What the server should do once the handler's response is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Continue(Response),
    ShutdownRequested(Response),
}

impl HandlerOutcome {
    pub fn response(&self) -> &Response {
        match self {
            HandlerOutcome::Continue(response) => response,
            HandlerOutcome::ShutdownRequested(response) => response,
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            HandlerOutcome::Continue(response) => response,
            HandlerOutcome::ShutdownRequested(response) => response,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, HandlerOutcome::ShutdownRequested(_))
    }
}

/// Executes login and shutdown requests against the session table
#[derive(Debug, Clone)]
pub struct RequestHandler {
    sessions: SessionTable,
}

impl RequestHandler {
    pub fn new(sessions: SessionTable) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Handles one request against the session table
    ///
    /// Only the login path writes to the table, and it saves the issued id
    /// whatever the outcome. Shutdown only reads it, so an id the server
    /// never issued stays invalid no matter how often it is retried.
    ///
    /// A body that does not belong to the header's action is a protocol
    /// error; nothing is saved and no response should be sent.
    pub fn handle(&self, in_flight: &mut InFlightRequest) -> Result<HandlerOutcome, ServerError> {
        match (in_flight.action, &in_flight.request) {
            (ActionCode::Login, Request::Login(ask)) => {
                Ok(self.handle_login(ask, &mut in_flight.session_id))
            }
            (ActionCode::Shutdown, Request::Shutdown(ask)) => {
                Ok(self.handle_shutdown(ask, &in_flight.session_id))
            }
            (action, _) => Err(ServerError::InvalidPackage(action)),
        }
    }

    fn handle_login(&self, ask: &LoginRequest, session_id: &mut SessionId) -> HandlerOutcome {
        info!("New {} body received, account={}", ActionCode::Login, ask.account);

        *session_id = SessionId::generate();
        let outcome = HandlerOutcome::Continue(Response::Login(LoginResponse {
            header: ResponseHeader::ok(ActionCode::Login, session_id.clone()),
            welcome: format!("Welcome {}", ask.account),
        }));

        self.sessions.save(session_id);
        outcome
    }

    fn handle_shutdown(&self, ask: &ShutdownRequest, session_id: &SessionId) -> HandlerOutcome {
        if !self.sessions.has(&ask.header.session_id) {
            info!(
                "Rejecting {} with unknown session {}",
                ActionCode::Shutdown,
                ask.header.session_id
            );
            return HandlerOutcome::Continue(Response::Error(ResponseHeader::failed(
                ActionCode::Shutdown,
                session_id.clone(),
                INVALID_SESSION_ID,
            )));
        }

        info!("New {} body received", ActionCode::Shutdown);

        HandlerOutcome::ShutdownRequested(Response::Shutdown(ShutdownResponse {
            header: ResponseHeader::ok(ActionCode::Shutdown, session_id.clone()),
        }))
    }
}
