//! In-memory page document: the view the client keeps in sync.

pub mod document;

pub use document::{quote_attribute, selector, Document, Fragment};
