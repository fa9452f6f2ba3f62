use thiserror::Error;

/// Failures talking to the CalmMate backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, timeout, or a body that did not decode.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
