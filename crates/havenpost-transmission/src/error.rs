//! Error types for the Transmission RPC client.

use thiserror::Error;

/// Errors produced while speaking to the Transmission RPC endpoint.
#[derive(Debug, Error)]
pub enum TransmissionError {
    /// Transport-level failure issuing the request.
    #[error("transmission request failed")]
    Http {
        /// Underlying reqwest error.
        #[from]
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-success HTTP status.
    #[error("transmission endpoint rejected the request")]
    Api {
        /// HTTP status code returned.
        status_code: u16,
        /// Response body when available.
        message: String,
    },
    /// The RPC layer reported a failure result.
    #[error("transmission rpc returned a failure result")]
    Rpc {
        /// The `result` string from the RPC envelope.
        result: String,
    },
    /// The response payload could not be decoded.
    #[error("transmission response could not be decoded")]
    Decode {
        /// Underlying deserialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias for Transmission client results.
pub type Result<T> = std::result::Result<T, TransmissionError>;
