//! CLI Table Output Formatter
//!
//! Generates human-readable terminal output with colored tables for an
//! `AuditStore`.

use std::collections::HashMap;

use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

use crate::issue::Issue;
use crate::store::AuditStore;

/// Format and print a scan's results to the terminal.
pub fn print_report(store: &AuditStore) {
    println!();
    print_header(store);
    print_summary(store);

    if !store.issues.is_empty() {
        print_issues_table(&store.issues);
    }

    print_footer(store);
}

fn print_header(store: &AuditStore) {
    println!("{}", "═".repeat(70).cyan());
    println!(
        "{} {}",
        "Audit Report".cyan().bold(),
        format!("(revision {})", store.revision).dimmed()
    );
    println!("{}", "═".repeat(70).cyan());
    println!();
    println!(
        "  {} {}",
        "Status:".bold(),
        status_colored(&store.status)
    );
    println!();
}

fn print_summary(store: &AuditStore) {
    println!("{}", "Summary".bold().underline());
    println!();
    println!(
        "  {} {:.1}%",
        "Progress:".bold(),
        store.progress
    );
    println!("  {} {}", "Sitemap size:".bold(), store.sitemap.len());
    println!("  {} {}", "Pages audited:".bold(), store.auditmap.len());
    println!("  {} {}", "Issues found:".bold(), store.issues.len());
    println!("  {} {}", "Plugins reported:".bold(), store.plugin_results.len());
    println!();

    let mut by_severity: HashMap<&str, usize> = HashMap::new();
    for issue in &store.issues {
        *by_severity.entry(issue.severity.as_str()).or_insert(0) += 1;
    }

    if !by_severity.is_empty() {
        println!("{}", "Issues by Severity".bold().underline());
        println!();
        for (severity, count) in ["high", "medium", "low"].iter().filter_map(|s| {
            by_severity.get(s).map(|c| (*s, *c))
        }) {
            println!("  {} {}", severity_label(severity), count);
        }
        println!();
    }
}

fn severity_label(severity: &str) -> colored::ColoredString {
    match severity {
        "high" => "High:    ".red().bold(),
        "medium" => "Medium:  ".yellow().bold(),
        "low" => "Low:     ".dimmed().bold(),
        other => other.white().bold(),
    }
}

fn status_colored(status: &str) -> colored::ColoredString {
    match status {
        "done" => status.green().bold(),
        "paused" => status.yellow().bold(),
        "auditing" | "crawling" => status.cyan().bold(),
        _ => status.white().bold(),
    }
}

fn print_issues_table(issues: &[Issue]) {
    println!("{}", "Issues".bold().underline());
    println!();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("Module").style_spec("bFc"),
        Cell::new("Element").style_spec("bFc"),
        Cell::new("Severity").style_spec("bFc"),
        Cell::new("Page").style_spec("bFc"),
        Cell::new("Name").style_spec("bFc"),
    ]));

    for issue in issues {
        let severity_cell = match issue.severity.as_str() {
            "high" => Cell::new("HIGH").style_spec("Fr"),
            "medium" => Cell::new("MEDIUM").style_spec("Fy"),
            "low" => Cell::new("LOW").style_spec("Fd"),
            other => Cell::new(other),
        };

        let page = if issue.page_url.len() > 40 {
            format!("{}...", &issue.page_url[..37])
        } else {
            issue.page_url.clone()
        };

        table.add_row(Row::new(vec![
            Cell::new(&issue.module),
            Cell::new(&format!("{:?}", issue.element)),
            severity_cell,
            Cell::new(&page),
            Cell::new(&issue.name),
        ]));
    }

    table.printstd();
    println!();
}

fn print_footer(store: &AuditStore) {
    let has_high = store.issues.iter().any(|i| i.severity == "high");
    let verdict = if has_high {
        "ISSUES FOUND".red().bold()
    } else if store.issues.is_empty() {
        "CLEAN".green().bold()
    } else {
        "MINOR ISSUES".yellow().bold()
    };

    println!("{}", "═".repeat(70).cyan());
    println!("{} {}", "Overall:".bold(), verdict);
    println!("{}", "═".repeat(70).cyan());
    println!();
}

/// Format issues as a simple non-interactive list, e.g. for `--lsrep`.
pub fn format_issues_list(issues: &[Issue]) -> String {
    let mut output = String::new();

    for (i, issue) in issues.iter().enumerate() {
        output.push_str(&format!(
            "{}. [{}] {} - {} ({})\n",
            i + 1,
            issue.module,
            issue.name,
            issue.description,
            issue.severity
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementKind;

    #[test]
    fn test_format_issues_list() {
        let issues = vec![Issue::new(
            ElementKind::Form,
            "sqli",
            "https://example.com/login",
            "SQL Injection",
            "Unescaped input in login form",
            "high",
        )];

        let output = format_issues_list(&issues);
        assert!(output.contains("sqli"));
        assert!(output.contains("SQL Injection"));
        assert!(output.contains("high"));
    }

    #[test]
    fn test_format_issues_list_empty() {
        assert_eq!(format_issues_list(&[]), "");
    }
}
