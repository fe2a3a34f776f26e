//! Error types for the etcd client

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur when configuring the client or talking to etcd
#[derive(Error, Debug)]
pub enum Error {
    /// Construction-time configuration was rejected
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Every candidate endpoint failed at the network layer
    #[error("No etcd server reachable after {attempts} attempt(s): {source}")]
    Unreachable {
        /// Number of endpoints tried before giving up
        attempts: usize,
        /// Transport failure from the last endpoint tried
        source: TransportError,
    },

    /// The server answered with a structured error payload
    #[error("Etcd error {code}: {message}")]
    Service {
        /// Numeric `errorCode` reported by the server
        code: u64,
        /// Human-readable message reported by the server
        message: String,
        /// Key or condition that triggered the error, if reported
        cause: Option<String>,
        /// Etcd index at the time of the error, if reported
        index: Option<u64>,
    },

    /// The response body was not the JSON object the API promises
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
