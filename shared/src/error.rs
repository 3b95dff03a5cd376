use crate::protocol::ActionCode;
use thiserror::Error;

/// Failures while encoding or decoding a datagram
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed package: {0}")]
    Decode(#[from] bincode::Error),

    #[error("package of {size} bytes exceeds the {limit} byte limit")]
    PackageTooLarge { size: usize, limit: usize },

    #[error("invalid response action {actual}, expected {expected}")]
    UnexpectedAction {
        expected: ActionCode,
        actual: ActionCode,
    },
}
