use thiserror::Error;

/// Failure reason reported for connectivity, timeout and non-2xx failures.
pub const NETWORK_ERROR: &str = "network error";
/// Failure reason reported when the response body has an unexpected shape.
pub const MALFORMED_RESPONSE: &str = "malformed response";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("message is empty")]
    EmptyInput,

    #[error("a request is already in flight")]
    Busy,

    #[error("no session has been started")]
    SessionNotStarted,

    #[error("image data is empty")]
    EmptyImage,

    #[error("client setup failed: {0}")]
    Setup(String),
}

impl RelayError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// The coarse reason carried by a failed completion. Anything that is not
    /// a malformed body is reported as a network error.
    pub fn failure_reason(&self) -> &'static str {
        match self {
            Self::MalformedResponse(_) => MALFORMED_RESPONSE,
            _ => NETWORK_ERROR,
        }
    }

    /// True for errors that reject a submission before any request is made.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Busy | Self::SessionNotStarted)
    }
}
