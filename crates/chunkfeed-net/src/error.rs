use thiserror::Error;
use url::Url;

/// Centralized error type for chunkfeed-net
#[derive(Debug, Error, Clone)]
pub enum NetError {
    /// Request could not be sent or the connection broke before a status arrived.
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Timeout")]
    Timeout,
    #[error("HTTP {status} for URL: {url}")]
    HttpError {
        url: Url,
        status: u16,
        body: Option<String>,
    },
    /// Status was fine but reading the body failed midway.
    #[error("body read failed: {0}")]
    Body(String),
}

impl NetError {
    /// Creates an HTTP status error
    pub fn http_error(status: u16, url: Url, body: Option<String>) -> Self {
        Self::HttpError { url, status, body }
    }

    /// Creates an HTTP error from a generic string
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Checks if this error indicates a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Timeout)
    }

    /// Checks if the server answered that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.status_code(), Some(404 | 410))
    }

    /// Gets the HTTP status code if this is an HTTP status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

pub type NetResult<T> = Result<T, NetError>;
