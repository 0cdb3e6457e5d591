//! The module contains the errors the engine can throw.
//!
//! - [`RemoteError`] is what a backend collaborator reports when a call fails.
//! - [`ListError`] is raised by the list controller for rejected intents.
//!
//! Upload and form errors live next to their state machines, see
//! [`UploadError`] and [`FormError`].
//!
//!  [`UploadError`]: crate::upload::UploadError
//!  [`FormError`]: crate::forms::FormError
use thiserror::Error;

/// Failure of a remote call, already classified by HTTP semantics.
///
/// Auth and lookup failures carry the server's text when it sent one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
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
    #[error("backend unreachable: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Text for the inline banner and toasts.
    ///
    /// Server supplied messages are surfaced verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(message) => message
                .clone()
                .unwrap_or_else(|| "Session expired or token missing.".to_string()),
            Self::Forbidden(message) => message
                .clone()
                .unwrap_or_else(|| "You do not have access to this resource.".to_string()),
            Self::NotFound(message) => message
                .clone()
                .unwrap_or_else(|| "Resource not found.".to_string()),
            Self::Conflict(message) | Self::Validation(message) | Self::Server(message) => {
                message.clone()
            }
            Self::Transport(message) => format!("Backend unreachable: {message}"),
        }
    }
}

/// Intents refused by [`ListController`](crate::ListController).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("page {requested} is out of range (1..={total_pages})")]
    PageOutOfRange { requested: u32, total_pages: u32 },
    #[error("page size must be greater than zero")]
    InvalidPageSize,
    #[error("list controller is closed")]
    Closed,
}
