//! Server network layer: socket loops, request dispatch and lifecycle

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{HandlerOutcome, InFlightRequest, RequestHandler};
use crate::session::SessionTable;
use log::{debug, error, info, warn};
use shared::{decode_request, encode_response, Response, PACKAGE_LIMIT};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a server, in the order it moves through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerState {
    Created,
    Listening,
    Stopping,
    Stopped,
}

/// A response waiting on the channel for the send loop
#[derive(Debug)]
pub struct PendingResponse {
    pub addr: SocketAddr,
    pub response: Response,
    /// Stop the server once this response has been written
    pub close_server: bool,
}

impl PendingResponse {
    pub fn from_outcome(addr: SocketAddr, outcome: HandlerOutcome) -> Self {
        let close_server = outcome.is_shutdown();
        Self {
            addr,
            response: outcome.into_response(),
            close_server,
        }
    }
}

/// State shared by the loops and every handle
#[derive(Debug)]
struct Lifecycle {
    state_tx: watch::Sender<ServerState>,
    shutdown: CancellationToken,
}

impl Lifecycle {
    /// Moves to `Stopping` and cancels all tasks, once
    ///
    /// Returns false when the server was already stopping or stopped.
    fn stop(&self, reason: &str) -> bool {
        let initiated = self.state_tx.send_if_modified(|state| {
            if *state < ServerState::Stopping {
                *state = ServerState::Stopping;
                true
            } else {
                false
            }
        });

        if initiated {
            info!("Server stopping: {}", reason);
            self.shutdown.cancel();
        }
        initiated
    }
}

/// A bound but not yet running server
#[derive(Debug)]
pub struct Server {
    socket: UdpSocket,
    config: ServerConfig,
    sessions: SessionTable,
    lifecycle: Arc<Lifecycle>,
}

impl Server {
    /// Binds the UDP socket without starting any task
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr.clone(),
                source,
            })?;
        info!("Server listening on {}", socket.local_addr()?);

        let (state_tx, _) = watch::channel(ServerState::Created);

        Ok(Server {
            socket,
            config,
            sessions: SessionTable::new(),
            lifecycle: Arc::new(Lifecycle {
                state_tx,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Binds and spawns the server, returning as soon as it is listening
    pub async fn start(config: ServerConfig) -> Result<ServerHandle, ServerError> {
        Ok(Self::bind(config).await?.spawn()?)
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn state(&self) -> ServerState {
        *self.lifecycle.state_tx.borrow()
    }

    /// Launches the receive loop, the send loop and a supervisor task
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let (handle, _response_tx) = self.spawn_loops()?;
        Ok(handle)
    }

    /// Like `spawn`, but also returns a sender onto the response channel
    ///
    /// The send loop runs until every sender is dropped, including this one.
    fn spawn_loops(self) -> Result<(ServerHandle, mpsc::Sender<PendingResponse>), ServerError> {
        let local_addr = self.socket.local_addr()?;
        let Server {
            socket,
            config,
            sessions,
            lifecycle,
        } = self;

        let socket = Arc::new(socket);
        let (response_tx, response_rx) = mpsc::channel(config.channel_capacity);
        let handler = Arc::new(RequestHandler::new(sessions.clone()));
        let permits = Arc::new(Semaphore::new(config.max_in_flight));

        lifecycle.state_tx.send_replace(ServerState::Listening);

        let receiver = tokio::spawn(receive_loop(
            Arc::clone(&socket),
            response_tx.clone(),
            handler,
            permits,
            Arc::clone(&lifecycle),
            config.request_timeout,
        ));
        let sender = tokio::spawn(send_loop(socket, response_rx, Arc::clone(&lifecycle)));
        tokio::spawn(supervise(Arc::clone(&lifecycle), receiver, sender));

        info!("Server started successfully");

        let handle = ServerHandle {
            local_addr,
            state_rx: lifecycle.state_tx.subscribe(),
            lifecycle,
            sessions,
        };
        Ok((handle, response_tx))
    }
}

/// Cloneable control handle for a running server
#[derive(Debug, Clone)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    lifecycle: Arc<Lifecycle>,
    state_rx: watch::Receiver<ServerState>,
    sessions: SessionTable,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        *self.state_rx.borrow()
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Requests shutdown; safe to call any number of times from any task
    ///
    /// Returns true only for the call that actually initiated the stop.
    pub fn stop(&self) -> bool {
        self.lifecycle.stop("stop requested")
    }

    /// Waits until both socket loops have finished and the socket is closed
    pub async fn join(&self) {
        let mut state_rx = self.state_rx.clone();
        loop {
            if *state_rx.borrow_and_update() == ServerState::Stopped {
                return;
            }
            if state_rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Marks the server stopped once both loops have exited
async fn supervise(lifecycle: Arc<Lifecycle>, receiver: JoinHandle<()>, sender: JoinHandle<()>) {
    if let Err(e) = receiver.await {
        error!("Receive loop panicked: {}", e);
        lifecycle.stop("receive loop panicked");
    }
    if let Err(e) = sender.await {
        error!("Send loop panicked: {}", e);
    }

    lifecycle.state_tx.send_replace(ServerState::Stopped);
    info!("Server stopped");
}

/// Reads datagrams and spawns one handler task per decoded request
async fn receive_loop(
    socket: Arc<UdpSocket>,
    response_tx: mpsc::Sender<PendingResponse>,
    handler: Arc<RequestHandler>,
    permits: Arc<Semaphore>,
    lifecycle: Arc<Lifecycle>,
    request_timeout: Duration,
) {
    let shutdown = lifecycle.shutdown.clone();
    let mut buffer = vec![0u8; PACKAGE_LIMIT];

    loop {
        let (len, addr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = socket.recv_from(&mut buffer) => match result {
                Ok(received) => received,
                Err(e) => {
                    error!("Cannot receive package, caused: {}", e);
                    lifecycle.stop("socket read failed");
                    break;
                }
            },
        };
        debug!("{} bytes read from {}", len, addr);

        let request = match decode_request(&buffer[..len]) {
            Ok(request) => request,
            Err(e) => {
                warn!("Dropping package from {}: {}", addr, e);
                continue;
            }
        };
        info!(
            "Received package from {}, action={}, session-id={}",
            addr,
            request.action(),
            request.session_id()
        );

        // Waiting here pushes back on the socket once max_in_flight handlers run
        let permit = tokio::select! {
            _ = shutdown.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        tokio::spawn(process_request(
            InFlightRequest::new(addr, request),
            Arc::clone(&handler),
            response_tx.clone(),
            shutdown.child_token(),
            request_timeout,
            permit,
        ));
    }

    debug!("Receive loop finished");
}

/// Runs one request to completion, bounded by a timeout and server shutdown
///
/// The timeout covers the wait for space on the response channel. Once a slot
/// is held the handler runs and its response is queued without awaiting, so a
/// login that saves a session always gets its response queued.
async fn process_request(
    mut in_flight: InFlightRequest,
    handler: Arc<RequestHandler>,
    response_tx: mpsc::Sender<PendingResponse>,
    cancel: CancellationToken,
    request_timeout: Duration,
    _permit: OwnedSemaphorePermit,
) {
    let addr = in_flight.addr;
    let action = in_flight.action;

    let slot = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("{} from {} abandoned, server is stopping", action, addr);
            return;
        }
        result = tokio::time::timeout(request_timeout, response_tx.reserve()) => match result {
            Ok(Ok(slot)) => slot,
            Ok(Err(_)) => {
                warn!("{} from {} aborted: {}", action, addr, ServerError::ChannelClosed);
                return;
            }
            Err(_) => {
                warn!("{} from {} timed out after {:?}", action, addr, request_timeout);
                return;
            }
        },
    };

    match handler.handle(&mut in_flight) {
        Ok(outcome) => slot.send(PendingResponse::from_outcome(addr, outcome)),
        Err(e) => warn!("{} from {} aborted: {}", action, addr, e),
    }
}

/// Drains the response channel onto the socket until every sender is gone
async fn send_loop(
    socket: Arc<UdpSocket>,
    mut response_rx: mpsc::Receiver<PendingResponse>,
    lifecycle: Arc<Lifecycle>,
) {
    while let Some(pending) = response_rx.recv().await {
        let data = match encode_response(&pending.response) {
            Ok(data) => data,
            Err(e) => {
                error!("Cannot encode response for {}, caused: {}", pending.addr, e);
                continue;
            }
        };

        match socket.send_to(&data, pending.addr).await {
            Ok(n) => debug!("{} bytes written to {}", n, pending.addr),
            Err(e) => {
                error!("Cannot send response to {}, caused: {}", pending.addr, e);
                lifecycle.stop("socket write failed");
                break;
            }
        }

        if pending.close_server {
            lifecycle.stop("shutdown requested by client");
        }
    }

    debug!("Send loop finished");
}
