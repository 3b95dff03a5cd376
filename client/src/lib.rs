//! # Session Client Library
//!
//! Client side of the session server protocol. A [`network::Client`] owns one
//! UDP socket connected to the server and performs synchronous-style
//! request/response exchanges over it.
//!
//! ## Session Handling
//! The client starts without a session. Every successful response carries a
//! session id, which the client adopts and stamps on each later request. A
//! login therefore authorises the shutdown request that follows it.
//!
//! ## Failure Modes
//! - Error envelopes from the server surface as `ClientError::Rejected`
//! - Lost datagrams surface as `ClientError::Timeout`; nothing is retried
//! - Responses for a different action surface as protocol errors
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use shared::{LoginRequest, Response, ShutdownRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:8888").await?;
//!
//!     if let Response::Login(ack) = client.request(LoginRequest::new("alice", "pw")).await? {
//!         println!("{}", ack.welcome);
//!     }
//!
//!     client.request(ShutdownRequest::new()).await?;
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod network;

pub use error::ClientError;
pub use network::{Client, ClientConfig};
