//! Output writers for analysis reports and summaries.
//!
//! This module handles writing data to disk and the terminal:
//! - JSON analysis reports and type summaries
//! - Text summaries of hot spots and types

pub mod json;
pub mod text;

// Re-export main functions
pub use json::{read_report, to_json_string, write_json, write_report};
pub use text::{render_hot_type, render_summary};
