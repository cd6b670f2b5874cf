//! Error taxonomy shared by the CLI and the HTTP surface.
//!
//! Every failure carries a message that is safe to show to the caller. The
//! binary turns an error into a process exit code, the server turns it into an
//! HTTP status; nothing is allowed to escape as a panic.

use thiserror::Error;
use warp::http::StatusCode;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Principal could not be parsed or is not strictly positive.
    #[error("{0}")]
    InvalidAmount(String),
    /// Due/payment date is not a valid `DDMMYYYY` calendar date.
    #[error("{0}")]
    InvalidDate(String),
    /// Rate period is not exactly six ASCII digits (`MMYYYY`) or names no real month.
    #[error("{0}")]
    InvalidPeriodFormat(String),
    /// No published rate for the resolved period (or year outside the supported range).
    #[error("{0}")]
    InsufficientData(String),
    /// Transport error, timeout or non-success status fetching the source page.
    #[error("{0}")]
    UpstreamUnavailable(String),
    /// The expected table is missing from the source page.
    ///
    /// Recovered by the store as an empty table; only parsing code returns it.
    #[error("{0}")]
    MalformedUpstreamDocument(String),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Server(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidAmount(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidPeriodFormat(_)
            | AppError::Config(_) => 2,
            AppError::InsufficientData(_) => 3,
            AppError::UpstreamUnavailable(_)
            | AppError::MalformedUpstreamDocument(_)
            | AppError::Io(_)
            | AppError::Server(_) => 4,
        }
    }

    /// HTTP status used when the error reaches the request boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidAmount(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidPeriodFormat(_)
            | AppError::InsufficientData(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable(_) | AppError::MalformedUpstreamDocument(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_) | AppError::Io(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
