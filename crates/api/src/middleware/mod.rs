//! Request middleware.

pub mod serve;

pub use serve::{pass_through, serve_layer};
