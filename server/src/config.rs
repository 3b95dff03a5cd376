//! Server tuning knobs
//!
//! Binaries build a `ServerConfig` from command-line arguments; tests usually
//! start from `ServerConfig::default()` and override the bind address.

use crate::error::ServerError;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the UDP socket binds to
    pub bind_addr: String,
    /// Capacity of the response channel between handlers and the send loop
    pub channel_capacity: usize,
    /// Maximum number of request handlers running at once
    pub max_in_flight: usize,
    /// Deadline for a handler to get space on the response channel
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8888".to_string(),
            channel_capacity: 100,
            max_in_flight: 64,
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Default configuration bound to the given address
    pub fn with_addr(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.channel_capacity == 0 {
            return Err(ServerError::Config(
                "channel capacity must be at least 1".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ServerError::Config(
                "max in-flight requests must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ServerError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
