//! Push channel frame handlers.

pub mod ws;

pub use ws::*;
