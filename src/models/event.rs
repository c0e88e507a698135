//! Inbound push events and their payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator field carried by every inbound frame.
pub const EVENT_TYPE_FIELD: &str = "type";

/// A chat message posted on the ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub user_name: String,
    /// Pre-formatted by the server; shown as-is.
    pub created: String,
    pub message: String,
    pub is_staff_reply: bool,
}

/// Event received over the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    TicketUpdate { status: String },
    NewMessage { message: MessagePayload },
    /// Any other `type`, or no string `type` at all. Carries the tag for logging.
    Unrecognized { kind: Option<String> },
}

/// Wire shape of the events this client understands.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownEvent {
    TicketUpdate { status: String },
    NewMessage { message: MessagePayload },
}

impl From<KnownEvent> for InboundEvent {
    fn from(event: KnownEvent) -> Self {
        match event {
            KnownEvent::TicketUpdate { status } => InboundEvent::TicketUpdate { status },
            KnownEvent::NewMessage { message } => InboundEvent::NewMessage { message },
        }
    }
}

impl InboundEvent {
    /// Decode one frame body.
    ///
    /// Errors only when the body is not JSON, or when a recognised `type` comes with a body
    /// that does not match its schema. Unknown or missing tags decode to `Unrecognized`.
    pub fn decode(frame: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(frame)?;
        match value.get(EVENT_TYPE_FIELD).and_then(Value::as_str) {
            Some("ticket_update") | Some("new_message") => {
                serde_json::from_value::<KnownEvent>(value).map(Self::from)
            }
            other => Ok(InboundEvent::Unrecognized {
                kind: other.map(String::from),
            }),
        }
    }

    /// The `type` tag, for log fields.
    pub fn kind(&self) -> &str {
        match self {
            InboundEvent::TicketUpdate { .. } => "ticket_update",
            InboundEvent::NewMessage { .. } => "new_message",
            InboundEvent::Unrecognized { kind } => kind.as_deref().unwrap_or("<none>"),
        }
    }
}
