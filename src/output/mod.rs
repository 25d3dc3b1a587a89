//! Output formatting module
//!
//! Formatters for the two supported report formats (spec §6): JSON
//! (machine-readable) and a colored CLI table (human-readable).

mod cli;
mod json;

pub use cli::{format_issues_list, print_report};
pub use json::{format_json, JsonReport};
