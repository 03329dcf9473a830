//! Output formatting: fixed-format terminal lines and JSON.

pub mod json;
pub mod terminal;
