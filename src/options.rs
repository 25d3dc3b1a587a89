//! Options — user configuration for a scan (spec §3, §4.1)
//!
//! Constructed once before the orchestrator and conceptually frozen once
//! `audit()` begins, save for one documented exception: `cookies` is
//! reshaped into a name→value map post-run for report ergonomics (spec §5).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::cli::Args;
use crate::error::{AuditError, Result};
use crate::page::Cookie;

/// A URL redundancy rule: "after this many visits to a URL matching
/// `pattern`, stop re-enqueueing it." Carries a mutable visit counter used
/// during scanning; the Audit Store must present the *original* limit, so
/// callers clone before first use (spec §4.1, §9).
#[derive(Debug, Clone)]
pub struct RedundancyRule {
    pub pattern: String,
    pub limit: usize,
    pub count: usize,
}

impl RedundancyRule {
    pub fn new(pattern: impl Into<String>, limit: usize) -> Self {
        Self {
            pattern: pattern.into(),
            limit,
            count: 0,
        }
    }

    /// Record a visit; returns `true` if the URL should still be enqueued.
    pub fn record_and_check(&mut self) -> bool {
        if self.count >= self.limit {
            return false;
        }
        self.count += 1;
        true
    }
}

/// User configuration for a scan.
#[derive(Debug, Clone)]
pub struct Options {
    /// Explicit seed list. Non-empty means the spider is never started
    /// (spec §4.1 step 2, §8 boundary behavior).
    pub restrict_paths: Vec<String>,

    pub audit_links: bool,
    pub audit_forms: bool,
    pub audit_cookies: bool,
    pub audit_headers: bool,

    /// Batching policy: defer harvesting until all URLs for a batch are
    /// enqueued (true), or harvest after every enqueue (false) (spec §4.1).
    pub http_harvest_last: bool,

    pub cookies: Vec<Cookie>,
    pub cookie_jar: Option<PathBuf>,
    pub user_agent: String,
    pub authed_by: Option<String>,

    /// Redundancy rules, deep-cloned at construction so the original limits
    /// survive into the final report even though `count` mutates during the
    /// scan (spec §4.1, §9).
    pub redundant: Vec<RedundancyRule>,

    /// Filter patterns for `lsmod`/`lsrep`/`lsplug` (conjunctive: AND of all
    /// supplied patterns, spec §4.4).
    pub lsmod: Vec<Regex>,
    pub lsrep: Vec<Regex>,
    pub lsplug: Vec<Regex>,

    pub concurrency: usize,
    pub timeout_secs: u64,

    pub start_datetime: Option<DateTime<Utc>>,
    pub finish_datetime: Option<DateTime<Utc>>,
    pub delta_time: Option<i64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            restrict_paths: Vec::new(),
            audit_links: true,
            audit_forms: true,
            audit_cookies: true,
            audit_headers: true,
            http_harvest_last: false,
            cookies: Vec::new(),
            cookie_jar: None,
            user_agent: format!("auditcore/{}", env!("CARGO_PKG_VERSION")),
            authed_by: None,
            redundant: Vec::new(),
            lsmod: Vec::new(),
            lsrep: Vec::new(),
            lsplug: Vec::new(),
            concurrency: 10,
            timeout_secs: 30,
            start_datetime: None,
            finish_datetime: None,
            delta_time: None,
        }
    }
}

impl Options {
    /// Construct Options from CLI arguments, applying the normalization
    /// rules of spec §4.1: cookie-string parsing, user-agent suffixing,
    /// cookie-jar existence check, redundancy-rule cloning.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut options = Options {
            restrict_paths: args.restrict_path.clone(),
            audit_links: !args.no_audit_links,
            audit_forms: !args.no_audit_forms,
            audit_cookies: !args.no_audit_cookies,
            audit_headers: !args.no_audit_headers,
            http_harvest_last: args.http_harvest_last,
            cookie_jar: args.cookie_jar.clone(),
            authed_by: args.authed_by.clone(),
            redundant: parse_redundancy_rules(&args.redundant),
            concurrency: args.concurrency,
            timeout_secs: args.timeout,
            ..Options::default()
        };

        // Cookies are scoped to the target URL (spec §4.1), not a wildcard —
        // falls back to the first restrict-path when no single target is
        // given, and to "*" for listing-only invocations with neither.
        let cookie_scope = args
            .target
            .clone()
            .or_else(|| args.restrict_path.first().cloned())
            .unwrap_or_else(|| "*".to_string());

        if let Some(ref cookie_string) = args.cookie_string {
            merge_cookies(&mut options.cookies, parse_cookie_string(cookie_string, &cookie_scope));
        }

        if let Some(ref jar_path) = options.cookie_jar {
            if !jar_path.exists() {
                return Err(AuditError::CookieJarMissing {
                    path: jar_path.clone(),
                });
            }
            let contents = std::fs::read_to_string(jar_path).map_err(|_| AuditError::CookieJarMissing {
                path: jar_path.clone(),
            })?;
            merge_cookies(&mut options.cookies, parse_cookie_string(&contents, &cookie_scope));
        }

        options.user_agent = match &options.authed_by {
            Some(authed_by) => format!(
                "auditcore/{} (Scan authorized by: {})",
                env!("CARGO_PKG_VERSION"),
                authed_by
            ),
            None => format!("auditcore/{}", env!("CARGO_PKG_VERSION")),
        };

        Ok(options)
    }
}

/// Parse a `"k1=v1;k2=v2"` cookie serialization string (spec §6). Each pair
/// splits once on `=`; both key and value are byte-exact (no decoding).
pub fn parse_cookie_string(serialized: &str, scope: &str) -> Vec<Cookie> {
    serialized
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            if pair.is_empty() {
                return None;
            }
            let (name, value) = pair.split_once('=')?;
            Some(Cookie {
                name: name.to_string(),
                value: value.to_string(),
                scope: scope.to_string(),
            })
        })
        .collect()
}

/// Parse `"PATTERN:LIMIT"` redundancy-rule strings from the CLI. A rule that
/// doesn't parse (missing `:`, non-numeric limit) is skipped rather than
/// aborting construction.
fn parse_redundancy_rules(raw: &[String]) -> Vec<RedundancyRule> {
    raw.iter()
        .filter_map(|entry| {
            let (pattern, limit) = entry.rsplit_once(':')?;
            let limit: usize = limit.parse().ok()?;
            Some(RedundancyRule::new(pattern, limit))
        })
        .collect()
}

/// Merge `incoming` into `existing` by key uniqueness (later entries win),
/// per spec §4.1 ("merged by key uniqueness into the cookie set").
pub fn merge_cookies(existing: &mut Vec<Cookie>, incoming: Vec<Cookie>) {
    for cookie in incoming {
        if let Some(slot) = existing.iter_mut().find(|c| c.name == cookie.name) {
            *slot = cookie;
        } else {
            existing.push(cookie);
        }
    }
}
