//! View mutations applied for inbound events: status change and message append.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::{debug, instrument};

use crate::dom::{quote_attribute, selector, Document, Fragment};
use crate::models::event::MessagePayload;

/// Class of the status display element; also its fixed base class.
pub const STATUS_CLASS: &str = "ticket-status";
/// Class of the container that holds the message thread.
pub const MESSAGES_SECTION_CLASS: &str = "messages-section";
pub const MESSAGE_BOX_CLASS: &str = "message-box";
pub const STAFF_MESSAGE_CLASS: &str = "staff-message";
pub const USER_MESSAGE_CLASS: &str = "user-message";

pub(crate) static STATUS: LazyLock<Selector> =
    LazyLock::new(|| selector(&format!(".{}", STATUS_CLASS)));
pub(crate) static MESSAGES_SECTION: LazyLock<Selector> =
    LazyLock::new(|| selector(&format!(".{}", MESSAGES_SECTION_CLASS)));
static AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector(".message-meta strong"));
static CREATED: LazyLock<Selector> = LazyLock::new(|| selector(".message-meta small"));
static CONTENT: LazyLock<Selector> = LazyLock::new(|| selector(".message-content"));

/// Class attribute for a status element showing `status`.
pub fn status_class_name(status: &str) -> String {
    format!("{} {}", STATUS_CLASS, status.to_lowercase())
}

/// Status element showing `status`. Tag and other attributes are copied from `current`;
/// only the class attribute and the text change.
fn status_fragment(current: ElementRef<'_>, status: &str) -> Fragment {
    let element = current.value();
    let mut markup = format!("<{}", element.name());
    for (name, value) in element.attrs().filter(|(name, _)| *name != "class") {
        markup.push_str(&format!(r#" {}="{}""#, name, quote_attribute(value)));
    }
    markup.push_str(&format!(
        r#" class="{}"></{}>"#,
        quote_attribute(&status_class_name(status)),
        element.name()
    ));

    let mut fragment = Fragment::parse(&markup);
    fragment.fill_text(&STATUS, status);
    fragment
}

/// Message block for one payload. Every server-supplied field goes in as text.
pub fn message_fragment(message: &MessagePayload) -> Fragment {
    let variant = if message.is_staff_reply {
        STAFF_MESSAGE_CLASS
    } else {
        USER_MESSAGE_CLASS
    };
    let mut fragment = Fragment::parse(&format!(
        concat!(
            r#"<div class="{} {}">"#,
            r#"<div class="message-meta"><strong></strong><small class="text-muted ml-2"></small></div>"#,
            r#"<div class="message-content mt-2"></div>"#,
            "</div>"
        ),
        MESSAGE_BOX_CLASS, variant
    ));
    fragment.fill_text(&AUTHOR, &message.user_name);
    fragment.fill_text(&CREATED, &message.created);
    fragment.fill_text(&CONTENT, &message.message);
    fragment
}

/// Text currently shown in the status element.
pub fn current_status(document: &Document) -> Option<String> {
    document
        .select_first(&STATUS)
        .map(|el| el.text().collect())
}

/// Message blocks in the thread, in display order.
pub fn message_blocks(document: &Document) -> Vec<ElementRef<'_>> {
    document
        .select_first(&MESSAGES_SECTION)
        .map(|section| section.children().filter_map(ElementRef::wrap).collect())
        .unwrap_or_default()
}

/// Owns the page document for the lifetime of the connection and applies mutations to it.
#[derive(Debug, Clone, Default)]
pub struct TicketRenderer {
    document: Document,
}

impl TicketRenderer {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Show `status` in the status element. Returns `false` when the page has no status element.
    #[instrument(skip(self))]
    pub fn apply_status_update(&mut self, status: &str) -> bool {
        let Some(current) = self.document.select_first(&STATUS) else {
            debug!("no status element on page");
            return false;
        };
        let fragment = status_fragment(current, status);
        self.document.replace_first(&STATUS, &fragment)
    }

    /// Append one message block at the end of the thread. Returns `false` when the page has
    /// no messages container.
    #[instrument(skip(self, message), fields(user_name = %message.user_name, staff = message.is_staff_reply))]
    pub fn append_message(&mut self, message: &MessagePayload) -> bool {
        if self.document.select_first(&MESSAGES_SECTION).is_none() {
            debug!("no messages section on page");
            return false;
        }
        self.document
            .append_fragment(&MESSAGES_SECTION, &message_fragment(message))
    }
}
