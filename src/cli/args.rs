//! CLI argument parsing using clap
//!
//! Defines all command-line arguments and their validation.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// auditcore - Web application security scan orchestrator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "auditcore",
    version,
    author,
    about = "Web application security scan orchestrator",
    long_about = "auditcore discovers pages on a target, fetches and parses them, \
                  dispatches pluggable security check modules against the \
                  elements each page exposes, and assembles the findings into \
                  a report.\n\nSupports an explicit seed list (--restrict-path) \
                  or spider-driven discovery from a single target URL."
)]
pub struct Args {
    /// Target URL to scan
    #[arg(value_name = "URL")]
    pub target: Option<String>,

    /// Restrict the scan to this path, bypassing the spider (repeatable)
    ///
    /// When given at least once, the spider never runs; these URLs become
    /// the entire seed set.
    #[arg(long = "restrict-path", value_name = "URL")]
    pub restrict_path: Vec<String>,

    /// Skip link-element modules
    #[arg(long)]
    pub no_audit_links: bool,

    /// Skip form-element modules
    #[arg(long)]
    pub no_audit_forms: bool,

    /// Skip cookie-element modules
    #[arg(long)]
    pub no_audit_cookies: bool,

    /// Skip header-element modules
    #[arg(long)]
    pub no_audit_headers: bool,

    /// Defer harvesting HTTP responses until every URL in a batch has been
    /// enqueued, instead of harvesting after each enqueue
    #[arg(long)]
    pub http_harvest_last: bool,

    /// Path to a cookie jar file to load before scanning
    #[arg(long, value_name = "FILE")]
    pub cookie_jar: Option<PathBuf>,

    /// Cookie serialization string, "name1=value1;name2=value2"
    #[arg(long, value_name = "STRING")]
    pub cookie_string: Option<String>,

    /// Custom User-Agent override
    #[arg(long, env = "AUDITCORE_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Identifier recorded in the User-Agent to attest scan authorization
    #[arg(long, value_name = "NAME")]
    pub authed_by: Option<String>,

    /// Redundancy rule "PATTERN:LIMIT" — stop re-enqueueing URLs matching
    /// the regex PATTERN once they've been visited LIMIT times (repeatable)
    #[arg(long = "redundant", value_name = "PATTERN:LIMIT")]
    pub redundant: Vec<String>,

    /// Number of concurrent in-flight HTTP requests
    #[arg(short = 'c', long, default_value = "10", value_name = "NUM")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(short = 't', long, default_value = "30", value_name = "SECS")]
    pub timeout: u64,

    /// Output format
    #[arg(short = 'f', long, default_value = "json", value_enum)]
    pub format: OutputFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// On-disk TOML configuration file; CLI flags take precedence on conflict
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug-level logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Quiet mode (only show errors)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// List loaded modules matching all given patterns, then exit
    #[arg(long = "lsmod", value_name = "PATTERN")]
    pub lsmod: Vec<String>,

    /// List issues matching all given patterns, then exit
    #[arg(long = "lsrep", value_name = "PATTERN")]
    pub lsrep: Vec<String>,

    /// List loaded plugins matching all given patterns, then exit
    #[arg(long = "lsplug", value_name = "PATTERN")]
    pub lsplug: Vec<String>,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    /// JSON output (machine-readable)
    #[value(name = "json")]
    Json,
    /// CLI table output (human-readable)
    #[value(name = "table")]
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

impl Args {
    /// Whether this invocation only lists something and should exit before
    /// running a scan.
    pub fn is_listing_only(&self) -> bool {
        !self.lsmod.is_empty() || !self.lsrep.is_empty() || !self.lsplug.is_empty()
    }

    /// Validate arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.target.is_none() && self.restrict_path.is_empty() && !self.is_listing_only() {
            return Err(
                "No input specified. Provide a target URL or --restrict-path.".to_string(),
            );
        }

        if let Some(ref target) = self.target {
            url::Url::parse(target).map_err(|e| format!("Invalid URL '{}': {}", target, e))?;
        }

        for path in &self.restrict_path {
            url::Url::parse(path).map_err(|e| format!("Invalid URL '{}': {}", path, e))?;
        }

        if self.concurrency == 0 {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }

    /// Construct a minimal `Args` for unit tests, bypassing clap parsing.
    #[cfg(test)]
    pub fn for_test(target: &str) -> Self {
        Self {
            target: Some(target.to_string()),
            restrict_path: Vec::new(),
            no_audit_links: false,
            no_audit_forms: false,
            no_audit_cookies: false,
            no_audit_headers: false,
            http_harvest_last: false,
            cookie_jar: None,
            cookie_string: None,
            user_agent: None,
            authed_by: None,
            redundant: Vec::new(),
            concurrency: 10,
            timeout: 30,
            format: OutputFormat::Json,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            lsmod: Vec::new(),
            lsrep: Vec::new(),
            lsplug: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Table.to_string(), "table");
    }

    #[test]
    fn test_validate_no_input() {
        let mut args = Args::for_test("https://example.com");
        args.target = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_with_target() {
        let args = Args::for_test("https://example.com");
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_with_restrict_path_only() {
        let mut args = Args::for_test("https://example.com");
        args.target = None;
        args.restrict_path = vec!["https://example.com/a".to_string()];
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_url() {
        let args = Args::for_test("not-a-valid-url");
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_verbose_and_quiet() {
        let mut args = Args::for_test("https://example.com");
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_listing_only_bypasses_input_requirement() {
        let mut args = Args::for_test("https://example.com");
        args.target = None;
        args.lsmod = vec![".*".to_string()];
        assert!(args.validate().is_ok());
    }
}
