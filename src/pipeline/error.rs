//! Errors raised inside the pipeline.

use axum::http::StatusCode;
use thiserror::Error;

use crate::message::Response;
use crate::scope::ScopeError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Anything a handler or middleware may raise.
#[derive(Debug, Error)]
pub enum Error {
    /// Expected outcome that already carries its response.
    #[error("request ended with status {}", .0.status_or_ok())]
    Exception(Response),

    /// A handler, middleware or service could not be instantiated.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// A handler or middleware panicked.
    #[error("panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    pub fn exception(response: Response) -> Self {
        Self::Exception(response)
    }

    /// Domain exception with a bare status and no body.
    pub fn status(status: StatusCode) -> Self {
        Self::Exception(Response::new().with_status(status))
    }

    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Error::Exception(_))
    }

    /// Status this error maps to when no catcher intervenes.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Exception(response) => response.status_or_ok(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panic(message)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Other(Box::new(error))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Other(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_status() {
        let error = Error::status(StatusCode::NOT_FOUND);
        assert!(error.is_exception());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "request ended with status 404 Not Found");
    }

    #[test]
    fn test_other_is_transparent() {
        let error = Error::other(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        assert_eq!(error.to_string(), "disk gone");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_panic_payloads() {
        let error = Error::from_panic(Box::new("boom"));
        assert_eq!(error.to_string(), "panicked: boom");
        let error = Error::from_panic(Box::new(String::from("bang")));
        assert_eq!(error.to_string(), "panicked: bang");
    }
}
