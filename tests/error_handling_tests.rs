//! Integration tests for the error taxonomy and the validation paths that
//! produce it: `Args::validate`, `Options::from_args`, `ScanConfig::load`.

use std::path::PathBuf;

use auditcore::{AuditError, Args, OutputFormat};
use auditcore::options::Options;
use auditcore::config::ScanConfig;

fn base_args(target: &str) -> Args {
    Args {
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

#[test]
fn args_validate_rejects_missing_input() {
    let mut args = base_args("https://example.com");
    args.target = None;
    let err = args.validate().expect_err("no target and no restrict-path");
    assert!(err.contains("No input specified"));
}

#[test]
fn args_validate_rejects_zero_concurrency() {
    let mut args = base_args("https://example.com");
    args.concurrency = 0;
    let err = args.validate().expect_err("zero concurrency is invalid");
    assert!(err.contains("Concurrency"));
}

#[test]
fn args_validate_rejects_malformed_restrict_path() {
    let mut args = base_args("https://example.com");
    args.restrict_path = vec!["not a url".to_string()];
    assert!(args.validate().is_err());
}

#[test]
fn args_validate_allows_listing_only_without_target_or_bad_concurrency() {
    let mut args = base_args("https://example.com");
    args.target = None;
    args.lsplug = vec!["sqli.*".to_string()];
    assert!(args.validate().is_ok());
}

#[test]
fn options_from_args_errors_when_cookie_jar_file_is_missing() {
    let mut args = base_args("https://example.com");
    args.cookie_jar = Some(PathBuf::from("/nonexistent/path/to/cookies.jar"));

    let err = Options::from_args(&args).expect_err("missing cookie jar must error");
    match err {
        AuditError::CookieJarMissing { path } => {
            assert_eq!(path, PathBuf::from("/nonexistent/path/to/cookies.jar"));
        }
        other => panic!("expected CookieJarMissing, got {:?}", other),
    }
}

#[test]
fn options_from_args_accepts_an_existing_cookie_jar() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let jar_path = dir.path().join("cookies.jar");
    std::fs::write(&jar_path, "session=abc123\n").expect("write cookie jar");

    let mut args = base_args("https://example.com");
    args.cookie_jar = Some(jar_path.clone());

    let options = Options::from_args(&args).expect("existing cookie jar is accepted");
    assert_eq!(options.cookie_jar, Some(jar_path));
}

#[test]
fn options_from_args_suffixes_user_agent_with_authed_by() {
    let mut args = base_args("https://example.com");
    args.authed_by = Some("pentest-engagement-42".to_string());

    let options = Options::from_args(&args).expect("valid args");
    assert!(options.user_agent.contains("pentest-engagement-42"));
    assert!(options.user_agent.starts_with("auditcore/"));
}

#[test]
fn scan_config_load_errors_on_missing_file() {
    let result = ScanConfig::load(std::path::Path::new("/nonexistent/auditcore.toml"));
    assert!(result.is_err());
}

#[test]
fn scan_config_load_reads_an_existing_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config_path = dir.path().join("auditcore.toml");
    std::fs::write(&config_path, "concurrency = 42\naudit_forms = false\n")
        .expect("write config file");

    let config = ScanConfig::load(&config_path).expect("existing file loads");
    assert_eq!(config.concurrency, Some(42));
    assert_eq!(config.audit_forms, Some(false));
}

#[test]
fn audit_error_messages_name_the_offending_url() {
    let err = AuditError::FetchFailed {
        url: "https://example.com/timeout".to_string(),
        reason: "connection reset".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("https://example.com/timeout"));
    assert!(message.contains("connection reset"));
}

#[test]
fn audit_error_wraps_url_parse_errors_via_from() {
    let parse_err = url::Url::parse("not a url").expect_err("deliberately malformed");
    let err: AuditError = parse_err.into();
    assert!(matches!(err, AuditError::UrlParseError(_)));
}
