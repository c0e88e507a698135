//! Channel binding: one push-channel connection per ticket-detail page.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::dom::Document;
use crate::error::{AppError, AppResult};
use crate::handlers::ws::{listen, ListenEnd};
use crate::models::connection::ConnectionState;
use crate::models::context::{TicketId, ViewContext};
use crate::services::renderer::TicketRenderer;
use crate::transport::Transport;

/// Decides whether a connection that ended gets another attempt.
pub trait ReconnectPolicy: Send + Sync + 'static {
    /// `attempt` counts connection attempts made so far (1 after the first). `None` ends the
    /// lifecycle in `last`.
    fn next_delay(&self, attempt: u32, last: ConnectionState) -> Option<Duration>;
}

/// Never reconnect: a refused or dropped connection stays down for the rest of the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl ReconnectPolicy for NoReconnect {
    fn next_delay(&self, _attempt: u32, _last: ConnectionState) -> Option<Duration> {
        None
    }
}

/// Push channel URL for a ticket shown on `page_url`: `ws://` for an `http` page, `wss://`
/// otherwise, same host and port, path `/ws/tickets/<id>/`.
pub fn channel_url(page_url: &Url, ticket_id: &TicketId) -> AppResult<Url> {
    let scheme = if page_url.scheme() == "http" { "ws" } else { "wss" };
    let host = page_url
        .host_str()
        .ok_or_else(|| AppError::UnsupportedPage(page_url.to_string()))?;

    let mut url = Url::parse(&format!("{}://{}/", scheme, host))?;
    url.set_port(page_url.port())
        .map_err(|_| AppError::UnsupportedPage(page_url.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AppError::UnsupportedPage(page_url.to_string()))?
        .clear()
        .extend(["ws", "tickets", ticket_id.as_str(), ""]);
    Ok(url)
}

/// Opens the push channel for the ticket on the current page.
///
/// Consumed by activation, so a page gets at most one connection.
pub struct ChannelBinder<T: Transport> {
    transport: T,
    page_url: Url,
    policy: Arc<dyn ReconnectPolicy>,
}

impl<T: Transport> ChannelBinder<T> {
    pub fn new(transport: T, page_url: Url) -> Self {
        Self {
            transport,
            page_url,
            policy: Arc::new(NoReconnect),
        }
    }

    pub fn with_reconnect_policy(mut self, policy: impl ReconnectPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Bind to the ticket the page shows. Returns `Ok(None)` without connecting when the page
    /// is not a ticket-detail view. Must be called inside a tokio runtime.
    pub fn activate(self, document: Document) -> AppResult<Option<ChannelHandle>> {
        match ViewContext::from_document(&document) {
            Some(context) => self.activate_for(context, document).map(Some),
            None => {
                debug!(page_url = %self.page_url, "no ticket context; push channel not opened");
                Ok(None)
            }
        }
    }

    /// Bind to an explicitly supplied ticket. The document is handed to the connection task
    /// and comes back from [`ChannelHandle::join`].
    pub fn activate_for(self, context: ViewContext, document: Document) -> AppResult<ChannelHandle> {
        let url = channel_url(&self.page_url, context.ticket_id())?;
        info!(ticket_id = %context.ticket_id(), url = %url, "binding push channel");

        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let task = tokio::spawn(run_channel(
            self.transport,
            url.clone(),
            self.policy,
            TicketRenderer::new(document),
            state_tx,
        ));

        Ok(ChannelHandle {
            url,
            state: state_rx,
            task,
        })
    }
}

async fn run_channel<T: Transport>(
    transport: T,
    url: Url,
    policy: Arc<dyn ReconnectPolicy>,
    mut renderer: TicketRenderer,
    state: watch::Sender<ConnectionState>,
) -> Document {
    let mut attempt: u32 = 0;
    loop {
        state.send_replace(ConnectionState::Connecting);
        attempt += 1;

        let ended = match transport.connect(&url).await {
            Ok(frames) => {
                state.send_replace(ConnectionState::Open);
                match listen(frames, &mut renderer).await {
                    ListenEnd::Closed => ConnectionState::Closed,
                    ListenEnd::Failed(_) => ConnectionState::Failed,
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, attempt, "push channel connect failed");
                ConnectionState::Failed
            }
        };
        state.send_replace(ended);

        match policy.next_delay(attempt, ended) {
            Some(delay) => {
                info!(url = %url, attempt, delay = ?delay, "reconnecting");
                tokio::time::sleep(delay).await;
            }
            None => {
                info!(url = %url, state = ended.as_str(), "push channel lifecycle ended");
                break;
            }
        }
    }
    renderer.into_document()
}

/// Handle to the page's push channel. There is no close: the connection lives until the
/// server ends it or the process exits.
#[derive(Debug)]
pub struct ChannelHandle {
    url: Url,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<Document>,
}

impl ChannelHandle {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Wait for the connection lifecycle to end and take back the page.
    pub async fn join(self) -> AppResult<Document> {
        self.task
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("channel task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::TicketDetailPage;
    use crate::services::renderer::{current_status, message_blocks, STATUS};
    use crate::transport::FrameStream;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_tungstenite::tungstenite;

    #[derive(Default)]
    struct Script {
        connects: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    struct ScriptedTransport {
        script: Arc<Script>,
        frames: Vec<String>,
        refuse: bool,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn connect(&self, url: &Url) -> AppResult<FrameStream> {
            self.script.connects.fetch_add(1, Ordering::SeqCst);
            self.script.urls.lock().unwrap().push(url.to_string());
            if self.refuse {
                return Err(AppError::Transport(tungstenite::Error::Io(std::io::Error::from(
                    std::io::ErrorKind::ConnectionRefused,
                ))));
            }
            let frames: Vec<AppResult<String>> = self.frames.iter().cloned().map(Ok).collect();
            Ok(futures::stream::iter(frames).boxed())
        }
    }

    fn transport(frames: &[&str], refuse: bool) -> (ScriptedTransport, Arc<Script>) {
        let script = Arc::new(Script::default());
        let transport = ScriptedTransport {
            script: script.clone(),
            frames: frames.iter().map(|f| f.to_string()).collect(),
            refuse,
        };
        (transport, script)
    }

    struct RetryTimes(u32);

    impl ReconnectPolicy for RetryTimes {
        fn next_delay(&self, attempt: u32, _last: ConnectionState) -> Option<Duration> {
            (attempt <= self.0).then_some(Duration::ZERO)
        }
    }

    fn page_url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn ticket(id: &str) -> TicketId {
        TicketId::new(id).unwrap()
    }

    #[test]
    fn url_scheme_follows_page_security() {
        let url = channel_url(&page_url("http://shop.local/support/tickets/42/"), &ticket("42")).unwrap();
        assert_eq!(url.as_str(), "ws://shop.local/ws/tickets/42/");

        let url = channel_url(&page_url("https://shop.example.com/x?y=1#z"), &ticket("42")).unwrap();
        assert_eq!(url.as_str(), "wss://shop.example.com/ws/tickets/42/");
    }

    #[test]
    fn url_keeps_explicit_port() {
        let url = channel_url(&page_url("http://127.0.0.1:8000/support/"), &ticket("7")).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/tickets/7/");

        let url = channel_url(&page_url("https://[::1]:8443/"), &ticket("7")).unwrap();
        assert_eq!(url.as_str(), "wss://[::1]:8443/ws/tickets/7/");
    }

    #[test]
    fn url_encodes_ticket_segment() {
        let url = channel_url(&page_url("http://h/"), &ticket("a/b c")).unwrap();
        assert_eq!(url.path(), "/ws/tickets/a%2Fb%20c/");
    }

    #[test]
    fn url_keeps_whitespace_ids_as_one_segment() {
        let url = channel_url(&page_url("http://h/"), &ticket("  ")).unwrap();
        assert_eq!(url.as_str(), "ws://h/ws/tickets/%20%20/");
    }

    #[test]
    fn url_requires_host() {
        let err = channel_url(&page_url("file:///tmp/page.html"), &ticket("1")).unwrap_err();
        assert_eq!(err.kind(), "unsupported_page");
    }

    #[tokio::test]
    async fn no_context_opens_nothing() {
        let (transport, script) = transport(&[], false);
        let binder = ChannelBinder::new(transport, page_url("http://h/"));
        let handle = binder.activate(Document::new()).unwrap();
        assert!(handle.is_none());
        tokio::task::yield_now().await;
        assert_eq!(script.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn end_to_end_over_scripted_channel() {
        let (transport, script) = transport(
            &[
                r#"{"type":"ticket_update","status":"Resolved"}"#,
                r#"{"type":"new_message","message":{"user_name":"Alice","created":"2024-01-01 10:00","message":"Thanks!","is_staff_reply":false}}"#,
            ],
            false,
        );
        let binder = ChannelBinder::new(transport, page_url("http://shop.local/support/tickets/42/"));
        let handle = binder
            .activate(TicketDetailPage::new("42", "Open").render())
            .unwrap()
            .unwrap();
        assert_eq!(handle.url().path(), "/ws/tickets/42/");

        let state = handle.watch_state();
        let doc = handle.join().await.unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Closed);
        assert_eq!(script.connects.load(Ordering::SeqCst), 1);
        assert_eq!(
            script.urls.lock().unwrap().as_slice(),
            ["ws://shop.local/ws/tickets/42/".to_string()]
        );

        let status = doc.select_first(&STATUS).unwrap();
        assert_eq!(status.value().attr("class"), Some("ticket-status resolved"));
        assert_eq!(current_status(&doc).as_deref(), Some("Resolved"));
        let blocks = message_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].value().classes().any(|c| c == "user-message"));
        assert_eq!(
            blocks[0].text().collect::<String>(),
            "Alice2024-01-01 10:00Thanks!"
        );
    }

    #[tokio::test]
    async fn https_page_connects_over_wss() {
        let (transport, script) = transport(&[r#"{"type":"ticket_update","status":"Closed"}"#], false);
        let binder = ChannelBinder::new(transport, page_url("https://support.example.com/support/tickets/42/"));
        let handle = binder
            .activate(TicketDetailPage::new("42", "Open").render())
            .unwrap()
            .unwrap();
        assert_eq!(handle.url().scheme(), "wss");

        let doc = handle.join().await.unwrap();
        assert_eq!(
            script.urls.lock().unwrap().as_slice(),
            ["wss://support.example.com/ws/tickets/42/".to_string()]
        );
        assert_eq!(current_status(&doc).as_deref(), Some("Closed"));
    }

    #[tokio::test]
    async fn refused_connection_is_not_retried_by_default() {
        let (transport, script) = transport(&[], true);
        let binder = ChannelBinder::new(transport, page_url("http://h/"));
        let ctx = ViewContext::new(ticket("9"));
        let original = TicketDetailPage::new("9", "Open").render();
        let handle = binder.activate_for(ctx, original.clone()).unwrap();
        let state = handle.watch_state();

        let doc = handle.join().await.unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Failed);
        assert_eq!(script.connects.load(Ordering::SeqCst), 1);
        assert_eq!(doc, original);
    }

    #[tokio::test]
    async fn policy_slot_controls_further_attempts() {
        let (transport, script) = transport(&[], true);
        let binder = ChannelBinder::new(transport, page_url("http://h/"))
            .with_reconnect_policy(RetryTimes(2));
        let handle = binder
            .activate_for(ViewContext::new(ticket("9")), Document::new())
            .unwrap();
        handle.join().await.unwrap();
        assert_eq!(script.connects.load(Ordering::SeqCst), 3);
    }
}
