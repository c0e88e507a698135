//! Client configuration loaded from environment.

use url::Url;

/// Client configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the page hosting the ticket view (e.g. `https://shop.example.com/support/tickets/42/`).
    /// Only its scheme and host are used to reach the push channel.
    pub page_url: Url,
    /// Ticket shown on the page. `None` means a non-detail page: the client stays idle.
    pub ticket_id: Option<String>,
    /// Status rendered into the page before any update arrives.
    pub initial_status: String,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let page_url = std::env::var("PAGE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000/support/tickets/".to_string());
        let page_url = Url::parse(&page_url).map_err(|_| ConfigLoadError::InvalidPageUrl)?;

        // Only an empty id means "no ticket"; whitespace is a real (if odd) id.
        let ticket_id = std::env::var("TICKET_ID").ok().filter(|s| !s.is_empty());
        let initial_status =
            std::env::var("TICKET_STATUS").unwrap_or_else(|_| "Open".to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            page_url,
            ticket_id,
            initial_status,
            log_level,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid PAGE_URL")]
    InvalidPageUrl,
}
