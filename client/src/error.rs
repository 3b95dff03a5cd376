use shared::ProtocolError;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot resolve server address {0}")]
    InvalidAddress(String),

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The server answered with an error envelope
    #[error("request rejected: {0}")]
    Rejected(String),
}
