use shared::domain::TermId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request did not complete (connect failure, timeout, reset).
    Network,
    /// The body was not a valid payload for the endpoint.
    Decode,
    /// The server answered with a non-2xx status.
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} error: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            status: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Decode,
            message: message.into(),
            status: None,
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Server,
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::server(status.as_u16(), err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("term {id} is not in the current results")]
    NotFound { id: TermId },
    #[error("invalid term id {0:?}")]
    InvalidInput(String),
    #[error("search session is closed")]
    Closed,
}
