//! Push channel lifecycle.

use serde::Serialize;

/// Lifecycle of the single push-channel connection.
///
/// `Closed` and `Failed` are terminal unless the binder's reconnect policy asks for
/// another attempt, in which case the state goes back to `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Open,
    /// An established connection ended cleanly.
    Closed,
    /// The connection could not be established, or dropped with a transport error.
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Failed => "failed",
        }
    }
}
