use engine::RemoteError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("not authenticated")]
    Unauthorized(Option<String>),
    #[error("access denied")]
    Forbidden(Option<String>),
    #[error("not found")]
    NotFound(Option<String>),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Classifies a non-2xx answer. `message` is the server's text, if any;
    /// the classes that need a message fall back to `status_line`.
    pub(crate) fn from_status(status: u16, message: Option<String>, status_line: &str) -> Self {
        let or_status =
            |message: Option<String>| message.unwrap_or_else(|| status_line.to_string());
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(or_status(message)),
            422 => Self::Validation(or_status(message)),
            _ => Self::Server(or_status(message)),
        }
    }
}

impl From<ClientError> for RemoteError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized(message) => Self::Unauthorized(message),
            ClientError::Forbidden(message) => Self::Forbidden(message),
            ClientError::NotFound(message) => Self::NotFound(message),
            ClientError::Conflict(message) => Self::Conflict(message),
            ClientError::Validation(message) => Self::Validation(message),
            ClientError::Server(message) => Self::Server(message),
            ClientError::Decode(message) => Self::Server(format!("unexpected response: {message}")),
            ClientError::InvalidUrl(message) => Self::Transport(format!("invalid url: {message}")),
            ClientError::Transport(err) => Self::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_classified() {
        assert!(matches!(
            ClientError::from_status(401, None, "401 Unauthorized"),
            ClientError::Unauthorized(None)
        ));
        assert!(matches!(
            ClientError::from_status(409, Some("dup".to_string()), "409 Conflict"),
            ClientError::Conflict(message) if message == "dup"
        ));
        assert!(matches!(
            ClientError::from_status(503, None, "503 Service Unavailable"),
            ClientError::Server(message) if message == "503 Service Unavailable"
        ));
    }

    #[test]
    fn not_found_keeps_server_text() {
        let err = ClientError::from_status(
            404,
            Some("Area office 9 does not exist".to_string()),
            "404 Not Found",
        );
        assert_eq!(
            RemoteError::from(err).user_message(),
            "Area office 9 does not exist"
        );
    }

    #[test]
    fn validation_message_survives_conversion() {
        let err = RemoteError::from(ClientError::Validation("Amount too large".to_string()));
        assert_eq!(err.user_message(), "Amount too large");
    }
}
