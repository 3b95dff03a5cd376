//! # Session Server Library
//!
//! This library provides a UDP request/response server that authenticates
//! clients with session ids. Clients log in to obtain a session id and may
//! then ask the server to shut itself down.
//!
//! ## Core Responsibilities
//!
//! ### Request Dispatch
//! Every datagram carries exactly one envelope. The server decodes the
//! envelope header first, decodes the full envelope for the action it names,
//! and hands the request to its own short-lived task. Malformed datagrams are
//! logged and dropped without affecting other requests.
//!
//! ### Session Tracking
//! Successful logins issue a fresh session id and record it in a concurrent
//! session table. A shutdown request is only honoured when it carries an id
//! found in that table; otherwise the client receives an error envelope.
//!
//! ### Lifecycle Control
//! The server moves through `Created → Listening → Stopping → Stopped`.
//! Stopping is triggered by a successful shutdown request, by a socket
//! failure, or by the owner of a [`network::ServerHandle`]. Repeated stop
//! requests are absorbed.
//!
//! ## Architecture Design
//!
//! ### Task Layout
//! - **Receive Loop**: single reader of the socket; decodes and dispatches
//! - **Request Handlers**: one task per request, bounded by a semaphore and
//!   a per-request timeout
//! - **Send Loop**: single writer of the socket; drains the response channel
//! - **Supervisor**: marks the server stopped once both loops have exited
//!
//! ### Backpressure
//! At most `max_in_flight` handlers run at once; when the limit is reached the
//! receive loop waits for a free slot before reading more datagrams. Handlers
//! also wait for space on the bounded response channel.
//!
//! ### Cancellation
//! A root cancellation token is cancelled on stop. Each handler runs under a
//! child token, so in-flight requests are abandoned instead of holding the
//! server open.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Bind address, channel capacity, handler limit and request timeout.
//!
//! ### Handler Module (`handler`)
//! Login and shutdown business logic, producing a `HandlerOutcome` that says
//! whether the server should keep running after the response is sent.
//!
//! ### Network Module (`network`)
//! Socket loops, request tasks and the lifecycle controller.
//!
//! ### Session Module (`session`)
//! The shared table of valid session ids.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = Server::start(ServerConfig::with_addr("127.0.0.1:8888")).await?;
//!     println!("listening on {}", handle.local_addr());
//!
//!     // Returns once a client with a valid session sends a shutdown request
//!     handle.join().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod network;
pub mod session;

pub use config::ServerConfig;
pub use error::ServerError;
pub use handler::{HandlerOutcome, InFlightRequest, RequestHandler};
pub use network::{PendingResponse, Server, ServerHandle, ServerState};
pub use session::{SessionEntry, SessionTable};
