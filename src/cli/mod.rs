//! CLI module
//!
//! Command-line interface using clap for argument parsing.

mod args;

pub use args::{Args, OutputFormat};
