// =============================================================================
// Fetch Errors — what can go wrong talking to the remote API
// =============================================================================
//
// Transport failures and malformed responses are reported to the user the
// same way (a generic message with a retry action). An empty result is not
// an error and never appears here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, timeout, TLS failure, body read failure.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx HTTP status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body parsed but its `status` field was not "success".
    #[error("{endpoint} reported status '{status}': {message}")]
    Envelope {
        endpoint: String,
        status: String,
        message: String,
    },

    /// The body was not JSON or lacked the expected payload.
    #[error("unexpected response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Envelope { endpoint, .. }
            | Self::Decode { endpoint, .. } => endpoint,
        }
    }

    /// Short machine-readable kind, recorded alongside the error log entry.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Envelope { .. } => "envelope",
            Self::Decode { .. } => "decode",
        }
    }
}
