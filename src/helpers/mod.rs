//! Helper functions for templates and rich text rendering

mod date;
mod html;

pub use date::*;
pub use html::*;
