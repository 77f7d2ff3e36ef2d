//! Client error types.

use curio_protocol::ResponseEnvelope;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] curio_protocol::ProtocolError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed before a complete response arrived")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("no response bytes received; sent: {sent:?}")]
    EmptyResponse { sent: String },

    #[error("cannot deserialize repaired response; sent: {sent:?}, repaired: {repaired:?}")]
    MalformedResponse {
        sent: String,
        raw: String,
        repaired: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response status: {envelope:?}")]
    UnexpectedStatus {
        sent: String,
        envelope: ResponseEnvelope,
    },

    #[error("license rejected by server: {envelope:?}")]
    License { envelope: ResponseEnvelope },

    #[error("a context is already established: {context}")]
    AlreadyLoggedIn { context: String },

    #[error("cannot log out, no context established")]
    NotLoggedIn,

    #[error("login reply carried no context token: {envelope:?}")]
    MissingContext { envelope: ResponseEnvelope },

    #[error("no columns given for sort")]
    EmptySortColumns,

    #[error("result data is missing `id`: {envelope:?}")]
    MissingResultId { envelope: ResponseEnvelope },

    #[error("result data is missing the match count: {envelope:?}")]
    MissingResultCount { envelope: ResponseEnvelope },

    #[error("fetch reply carried no rows: {envelope:?}")]
    MissingRows { envelope: ResponseEnvelope },

    #[error("fetched row is missing its row number")]
    MissingRowNumber,
}

impl ClientError {
    /// Returns whether this error is potentially retryable after a
    /// reconnect. Session-state and query-usage errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_) | ClientError::Timeout | ClientError::ConnectionClosed
        )
    }
}
