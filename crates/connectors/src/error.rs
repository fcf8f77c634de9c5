use thiserror::Error;

/// Errors surfaced by a remote-read or remote-write client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection refused, reset, DNS failure and similar.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The remote storage answered with a non-success status.
    #[error("Remote storage responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded or violated the protocol.
    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to build client: {0}")]
    Build(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Protocol(err.to_string())
        } else if err.is_builder() {
            ClientError::Build(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Invalid authentication or TLS options for a client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientConfigError {
    #[error("at most one of basic_auth (username/password) and bearer_token may be configured")]
    BasicAndBearer,

    #[error("at most one of password and password_file may be configured")]
    PasswordAndFile,

    #[error("at most one of bearer_token and bearer_token_file may be configured")]
    BearerAndFile,

    #[error("password is set but username is missing")]
    PasswordWithoutUsername,

    #[error("client certificate and key must be configured together")]
    IncompleteClientCert,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}
