//! Binding between the displayed page and the ticket it shows.

use std::fmt;
use std::sync::LazyLock;

use scraper::Selector;

use crate::dom::{selector, Document};

/// Element id of the ticket-detail root.
pub const DETAIL_ROOT_ID: &str = "ticket-detail";
/// Attribute on the detail root that carries the ticket identifier.
pub const TICKET_ID_ATTRIBUTE: &str = "data-ticket-id";

static DETAIL_ROOT: LazyLock<Selector> =
    LazyLock::new(|| selector(&format!("#{}", DETAIL_ROOT_ID)));

/// Opaque ticket identifier, exactly as rendered into the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketId(String);

impl TicketId {
    /// Returns `None` only for the empty string. Whitespace is kept as-is: it is a present
    /// (if odd) identifier, the same way a page script would see it.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The ticket a detail view is bound to. Computed once when the page is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    ticket_id: TicketId,
}

impl ViewContext {
    pub fn new(ticket_id: TicketId) -> Self {
        Self { ticket_id }
    }

    /// Read the context from a rendered page. `None` on any page that is not a ticket
    /// detail view; that is a normal outcome, not an error.
    pub fn from_document(document: &Document) -> Option<Self> {
        let root = document.select_first(&DETAIL_ROOT)?;
        let raw = root.value().attr(TICKET_ID_ATTRIBUTE)?;
        TicketId::new(raw).map(Self::new)
    }

    pub fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }
}
