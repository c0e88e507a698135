//! Application error types for the ticket view client.

use thiserror::Error;

/// Application-level errors.
///
/// None of these ever reach the rendered page: the listener logs and keeps going,
/// and only the binary entry point turns them into a process exit.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Page URL cannot host a push channel: {0}")]
    UnsupportedPage(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidUrl(_) => "invalid_url",
            AppError::UnsupportedPage(_) => "unsupported_page",
            AppError::Transport(_) => "transport",
            AppError::Internal(_) => "internal",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite;

    #[test]
    fn sources_convert() {
        let err: AppError = url::Url::parse("not a url").unwrap_err().into();
        assert_eq!(err.kind(), "invalid_url");

        let err: AppError = tungstenite::Error::ConnectionClosed.into();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().starts_with("Transport error"));
    }
}
