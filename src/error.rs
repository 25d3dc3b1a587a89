//! Error types for auditcore
//!
//! Centralized error handling: one `thiserror`-derived enum covering the
//! taxonomy of spec §7, converted via `#[from]` at the transport/io/json/url
//! boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the auditcore orchestrator
#[derive(Debug, Error)]
pub enum AuditError {
    /// Configuration error raised at construction time (§7: Configuration errors abort immediately)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The configured cookie-jar file does not exist
    #[error("Cookie jar not found at '{path}'")]
    CookieJarMissing { path: PathBuf },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Navigation/fetch to a URL failed
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// Request timed out
    #[error("Request timeout for '{url}' after {timeout_secs} seconds")]
    RequestTimeout { url: String, timeout_secs: u64 },

    /// Page parsing failed
    #[error("Failed to parse page for '{url}': {reason}")]
    PageParseFailed { url: String, reason: String },

    /// A module raised a non-terminal fault; scan continues (§7: Module fault)
    #[error("Module '{module}' faulted on '{url}': {reason}")]
    ModuleFault {
        module: String,
        url: String,
        reason: String,
    },

    /// A plugin raised a non-terminal fault; scan continues (§7: Plugin fault)
    #[error("Plugin '{plugin}' faulted: {reason}")]
    PluginFault { plugin: String, reason: String },

    /// The audit pipeline or post-audit hook faulted; reports still run (§7: Pipeline fault)
    #[error("Audit pipeline fault: {reason}")]
    PipelineFault { reason: String },

    /// A report formatter faulted; other reports still run (§7: Report fault)
    #[error("Report generation failed: {reason}")]
    ReportFault { reason: String },

    /// File read/write error
    #[error("File operation failed for '{path}': {reason}")]
    FileError { path: PathBuf, reason: String },

    /// Output formatting/writing failed
    #[error("Output error: {reason}")]
    OutputError { reason: String },

    /// Sitemap parsing failed
    #[error("Failed to parse sitemap from '{url}': {reason}")]
    SitemapParseFailed { url: String, reason: String },

    /// Generic IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML configuration parsing error
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Result type alias for AuditError
pub type Result<T> = std::result::Result<T, AuditError>;
