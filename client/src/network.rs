use crate::error::ClientError;
use log::{debug, warn};
use shared::{
    decode_response, encode_request, ActionCode, Request, Response, SessionId, PACKAGE_LIMIT,
};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long to wait for each response
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Request/response client bound to a single server
///
/// The client remembers the session id of the last successful response and
/// stamps it on every request it sends. Only one request is in flight at a
/// time.
pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    session_id: SessionId,
    timeout: Duration,
}

impl Client {
    pub async fn connect(address: &str) -> Result<Self, ClientError> {
        Self::connect_with(address, ClientConfig::default()).await
    }

    pub async fn connect_with(address: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let server_addr = lookup_host(address)
            .await?
            .next()
            .ok_or_else(|| ClientError::InvalidAddress(address.to_string()))?;

        let local = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server_addr).await?;
        debug!("Client socket {} connected to {}", socket.local_addr()?, server_addr);

        Ok(Client {
            socket,
            server_addr,
            session_id: SessionId::default(),
            timeout: config.timeout,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    /// Session id adopted from the last successful response
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Sends a request and waits for its response
    ///
    /// Error envelopes from the server come back as `ClientError::Rejected`
    /// and leave the stored session id untouched. Replies that arrived after
    /// an earlier request timed out are discarded before sending.
    pub async fn request(&mut self, request: impl Into<Request>) -> Result<Response, ClientError> {
        let mut request = request.into();
        request.set_session_id(self.session_id.clone());

        self.discard_stale_responses()?;
        self.send_request(&request).await?;
        self.receive_response(request.action()).await
    }

    /// Drops every datagram already queued on the socket
    fn discard_stale_responses(&self) -> Result<usize, ClientError> {
        let mut buffer = vec![0u8; PACKAGE_LIMIT];
        let mut discarded = 0;
        loop {
            match self.socket.try_recv(&mut buffer) {
                Ok(len) => {
                    warn!("Discarding stale {} byte response from {}", len, self.server_addr);
                    discarded += 1;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(discarded),
                // Left over from an earlier send to a port nobody listened on
                Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                    debug!("Discarding stale error from {}: {}", self.server_addr, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn send_request(&self, request: &Request) -> Result<(), ClientError> {
        let data = encode_request(request)?;
        let n = self.socket.send(&data).await?;
        debug!("{} bytes was sent to {}", n, self.server_addr);
        Ok(())
    }

    async fn receive_response(&mut self, action: ActionCode) -> Result<Response, ClientError> {
        let mut buffer = vec![0u8; PACKAGE_LIMIT];
        let len = timeout(self.timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;
        debug!("{} bytes was received from {}", len, self.server_addr);

        let response = decode_response(&buffer[..len], action)?;
        debug!(
            "received session id: {}, action={}",
            response.session_id(),
            action
        );

        if let Response::Error(header) = response {
            return Err(ClientError::Rejected(header.error));
        }

        self.session_id = response.session_id().clone();
        Ok(response)
    }

    /// Closes the socket; the client cannot be used afterwards
    pub fn close(self) {
        let Client {
            socket,
            server_addr,
            ..
        } = self;
        drop(socket);
        debug!("Client for {} closed", server_addr);
    }
}
