//! WebSocket transport backed by `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info};
use url::Url;

use super::{FrameStream, Transport};
use crate::error::{AppError, AppResult};

/// Real WebSocket client. Ping/pong is answered by the protocol layer; only text frames
/// are surfaced. `wss://` goes through rustls with the bundled webpki roots.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &Url) -> AppResult<FrameStream> {
        // Fails only when a provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let (socket, response) = connect_async(url.as_str()).await?;
        info!(url = %url, status = %response.status(), "ws connected");

        // The client never sends, so only the read half is kept. Dropping the write half
        // does not close the socket.
        let (_sink, stream) = socket.split();
        Ok(text_frames(stream))
    }
}

/// Text payloads of `messages`, in order.
///
/// A close frame is not the end: the stream keeps being read so the closing handshake
/// completes, and a socket error after it counts as a clean end rather than a failure.
pub(crate) fn text_frames<S>(messages: S) -> FrameStream
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Send + 'static,
{
    messages
        .scan(false, |closing, msg| {
            let item = match msg {
                Ok(Message::Text(text)) => Some(Some(Ok(text.to_string()))),
                Ok(Message::Close(frame)) => {
                    debug!(frame = ?frame, "close frame received");
                    *closing = true;
                    Some(None)
                }
                Ok(Message::Binary(data)) => {
                    debug!(len = data.len(), "ignoring binary frame");
                    Some(None)
                }
                Ok(_) => Some(None),
                Err(e) if *closing => {
                    debug!(error = %e, "socket ended after close frame");
                    None
                }
                Err(e) => Some(Some(Err(AppError::from(e)))),
            };
            futures::future::ready(item)
        })
        .filter_map(futures::future::ready)
        .boxed()
}
