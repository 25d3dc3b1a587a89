//! On-disk TOML configuration (spec §4.3)
//!
//! `ScanConfig` mirrors the CLI flags a caller might want to pin in a
//! checked-in file rather than repeat on every invocation. CLI flags always
//! win on conflict — `apply_to` only fills in values the CLI left at its
//! default/unset state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::error::Result;

/// Configuration loaded from an on-disk TOML file. Every field is optional;
/// only fields present in the file are considered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub restrict_paths: Option<Vec<String>>,
    pub audit_links: Option<bool>,
    pub audit_forms: Option<bool>,
    pub audit_cookies: Option<bool>,
    pub audit_headers: Option<bool>,
    pub http_harvest_last: Option<bool>,
    pub user_agent: Option<String>,
    pub authed_by: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout: Option<u64>,
}

impl ScanConfig {
    pub fn from_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Merge this file-sourced config into `args`, filling in only values
    /// the CLI left unset. CLI flags take precedence on conflict (spec §4.3).
    pub fn apply_to(&self, args: &mut Args) {
        if args.restrict_path.is_empty() {
            if let Some(ref restrict_paths) = self.restrict_paths {
                args.restrict_path = restrict_paths.clone();
            }
        }
        if !args.no_audit_links {
            if let Some(false) = self.audit_links {
                args.no_audit_links = true;
            }
        }
        if !args.no_audit_forms {
            if let Some(false) = self.audit_forms {
                args.no_audit_forms = true;
            }
        }
        if !args.no_audit_cookies {
            if let Some(false) = self.audit_cookies {
                args.no_audit_cookies = true;
            }
        }
        if !args.no_audit_headers {
            if let Some(false) = self.audit_headers {
                args.no_audit_headers = true;
            }
        }
        if !args.http_harvest_last {
            if let Some(true) = self.http_harvest_last {
                args.http_harvest_last = true;
            }
        }
        if args.user_agent.is_none() {
            args.user_agent = self.user_agent.clone();
        }
        if args.authed_by.is_none() {
            args.authed_by = self.authed_by.clone();
        }
        if args.concurrency == 10 {
            if let Some(concurrency) = self.concurrency {
                args.concurrency = concurrency;
            }
        }
        if args.timeout == 30 {
            if let Some(timeout) = self.timeout {
                args.timeout = timeout;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_parses_partial_config() {
        let toml = r#"
            concurrency = 20
            audit_forms = false
        "#;
        let config = ScanConfig::from_str(toml).unwrap();
        assert_eq!(config.concurrency, Some(20));
        assert_eq!(config.audit_forms, Some(false));
        assert_eq!(config.audit_links, None);
    }

    #[test]
    fn test_apply_to_fills_unset_cli_values() {
        let config = ScanConfig {
            concurrency: Some(25),
            audit_forms: Some(false),
            ..Default::default()
        };
        let mut args = Args::for_test("https://example.com");
        config.apply_to(&mut args);
        assert_eq!(args.concurrency, 25);
        assert!(args.no_audit_forms);
    }

    #[test]
    fn test_apply_to_never_overrides_explicit_cli_value() {
        let config = ScanConfig {
            concurrency: Some(25),
            ..Default::default()
        };
        let mut args = Args::for_test("https://example.com");
        args.concurrency = 5;
        config.apply_to(&mut args);
        assert_eq!(args.concurrency, 5);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = ScanConfig::load(Path::new("/nonexistent/auditcore.toml"));
        assert!(result.is_err());
    }
}
