//! Push channel transports.

pub mod ws;

use async_trait::async_trait;
use futures::stream::BoxStream;
use url::Url;

use crate::error::AppResult;

pub use ws::WsTransport;

/// Text frames in arrival order. The stream ends when the connection closes; an `Err` item
/// reports a connection-level failure and the listener stops reading there.
pub type FrameStream = BoxStream<'static, AppResult<String>>;

/// Opens receive-only push channel connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connect to `url`. Frames that arrive before the stream is polled are buffered, so none
    /// are missed between connecting and listening.
    async fn connect(&self, url: &Url) -> AppResult<FrameStream>;
}
