//! Inbound frame handling: decode, classify by `type`, route to the renderer.

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::event::InboundEvent;
use crate::services::renderer::TicketRenderer;

/// What handling one frame did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    StatusUpdated,
    MessageAppended,
    /// Recognised event, but the element it targets is not on the page.
    TargetMissing,
    /// Unknown or missing `type`.
    Ignored,
    /// Not JSON, or a recognised `type` with the wrong shape. Dropped.
    Malformed,
}

/// Route a decoded event to its view mutation.
pub fn dispatch(renderer: &mut TicketRenderer, event: &InboundEvent) -> Dispatch {
    match event {
        InboundEvent::TicketUpdate { status } => {
            if renderer.apply_status_update(status) {
                Dispatch::StatusUpdated
            } else {
                Dispatch::TargetMissing
            }
        }
        InboundEvent::NewMessage { message } => {
            if renderer.append_message(message) {
                Dispatch::MessageAppended
            } else {
                Dispatch::TargetMissing
            }
        }
        InboundEvent::Unrecognized { .. } => {
            debug!(kind = %event.kind(), "ignoring event");
            Dispatch::Ignored
        }
    }
}

/// Handle one text frame. A frame that fails to decode is logged and dropped; it never
/// stops the listener.
pub fn handle_frame(renderer: &mut TicketRenderer, frame: &str) -> Dispatch {
    match InboundEvent::decode(frame) {
        Ok(event) => {
            let outcome = dispatch(renderer, &event);
            debug!(kind = %event.kind(), outcome = ?outcome, "frame handled");
            outcome
        }
        Err(e) => {
            warn!(error = %e, len = frame.len(), "dropping malformed frame");
            Dispatch::Malformed
        }
    }
}

/// How a listen loop ended.
#[derive(Debug)]
pub enum ListenEnd {
    /// The stream finished normally.
    Closed,
    /// The transport reported an error.
    Failed(crate::error::AppError),
}

/// Consume frames one at a time until the stream ends. Frames are handled strictly in
/// arrival order, each to completion before the next is read.
pub async fn listen<S>(mut frames: S, renderer: &mut TicketRenderer) -> ListenEnd
where
    S: Stream<Item = AppResult<String>> + Unpin,
{
    let mut handled: u64 = 0;
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(text) => {
                handle_frame(renderer, &text);
                handled += 1;
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), handled, "push channel failed");
                return ListenEnd::Failed(e);
            }
        }
    }
    info!(handled, "push channel closed");
    ListenEnd::Closed
}
