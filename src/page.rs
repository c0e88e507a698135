//! Builder for the server-rendered ticket-detail markup the client runs against.

use std::sync::LazyLock;

use scraper::Selector;

use crate::dom::{quote_attribute, selector, Document, Fragment};
use crate::models::context::{DETAIL_ROOT_ID, TICKET_ID_ATTRIBUTE};
use crate::models::event::MessagePayload;
use crate::services::renderer::{
    message_fragment, status_class_name, MESSAGES_SECTION, MESSAGES_SECTION_CLASS, STATUS,
};

/// Status labels the ticketing backend renders.
pub const KNOWN_STATUSES: [&str; 4] = ["Open", "In Progress", "Resolved", "Closed"];

static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

/// A ticket-detail page as the server would render it.
#[derive(Debug, Clone)]
pub struct TicketDetailPage {
    pub ticket_id: String,
    pub status: String,
    pub messages: Vec<MessagePayload>,
}

impl TicketDetailPage {
    pub fn new(ticket_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            status: status.into(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<MessagePayload>) -> Self {
        self.messages = messages;
        self
    }

    /// Render into a fresh document:
    /// `div#ticket-detail[data-ticket-id] > (span.ticket-status, div.messages-section)`.
    pub fn render(&self) -> Document {
        let mut skeleton = Fragment::parse(&format!(
            r#"<div id="{}" {}="{}"><span class="{}"></span><div class="{}"></div></div>"#,
            DETAIL_ROOT_ID,
            TICKET_ID_ATTRIBUTE,
            quote_attribute(&self.ticket_id),
            quote_attribute(&status_class_name(&self.status)),
            MESSAGES_SECTION_CLASS,
        ));
        skeleton.fill_text(&STATUS, &self.status);

        let mut doc = Document::new();
        doc.append_fragment(&BODY, &skeleton);
        for message in &self.messages {
            doc.append_fragment(&MESSAGES_SECTION, &message_fragment(message));
        }
        doc
    }
}
