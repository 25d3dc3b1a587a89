//! Issue — a structured finding produced by a module (spec §3).

use serde::{Deserialize, Serialize};

use crate::page::ElementKind;

/// A finding produced by a module against a specific page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// The element class this finding concerns.
    pub element: ElementKind,
    /// The module that produced this issue.
    pub module: String,
    /// URL of the offending page.
    pub page_url: String,
    /// Short human-readable name of the vulnerability.
    pub name: String,
    /// Detailed description of the finding.
    pub description: String,
    /// Severity, left as a free-form label since modules define their own scales.
    pub severity: String,
}

impl Issue {
    pub fn new(
        element: ElementKind,
        module: impl Into<String>,
        page_url: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            element,
            module: module.into(),
            page_url: page_url.into(),
            name: name.into(),
            description: description.into(),
            severity: severity.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_new() {
        let issue = Issue::new(
            ElementKind::Form,
            "sqli",
            "https://example.com/login",
            "SQL Injection",
            "Unescaped input in login form",
            "high",
        );
        assert_eq!(issue.module, "sqli");
        assert_eq!(issue.element, ElementKind::Form);
    }
}
