use shared::{ActionCode, ProtocolError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("invalid package for action {0}")]
    InvalidPackage(ActionCode),

    #[error("response channel closed")]
    ChannelClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}
