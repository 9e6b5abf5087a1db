use thiserror::Error;

/// Failure of a single request against the chat server.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RequestError {
    /// The request never produced a response.
    #[error("{0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),

    /// The server answered but rejected the request at the application level.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The server answered with a success status but an unreadable body.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> RequestError {
        return RequestError::Network(err.to_string());
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> RequestError {
        return RequestError::Malformed(err.to_string());
    }
}
