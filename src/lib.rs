//! Live ticket-detail view kept in sync over a WebSocket push channel.
//!
//! The binder opens one receive-only connection for the ticket shown on the page; every
//! inbound frame is decoded and routed to one of two view mutations (status change,
//! message append) on an in-memory page document.

pub mod config;
pub mod dom;
pub mod error;
pub mod handlers;
pub mod models;
pub mod page;
pub mod services;
pub mod transport;

pub use config::Config;
pub use dom::Document;
pub use error::{AppError, AppResult};
pub use models::{ConnectionState, InboundEvent, MessagePayload, TicketId, ViewContext};
pub use page::TicketDetailPage;
pub use services::binder::{channel_url, ChannelBinder, ChannelHandle, NoReconnect, ReconnectPolicy};
pub use services::renderer::TicketRenderer;
pub use transport::{Transport, WsTransport};
