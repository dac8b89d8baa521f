use thiserror::Error;

/// Failures seen by the session client when talking to the relay.
/// Transitions never surface these; they are logged and the state is left as it was.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected relay response: {0}")]
    Decode(String),
    #[error("Image URL missing in response")]
    UrlMissing,
    #[error("token storage: {0}")]
    Storage(#[from] std::io::Error),
}

impl SessionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
