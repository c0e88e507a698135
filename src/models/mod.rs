//! Data models for the ticket view context, inbound events, and connection state.

pub mod connection;
pub mod context;
pub mod event;

pub use connection::*;
pub use context::*;
pub use event::*;
