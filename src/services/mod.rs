//! Channel binding and view rendering.

pub mod binder;
pub mod renderer;

pub use binder::{ChannelBinder, ChannelHandle};
pub use renderer::TicketRenderer;
