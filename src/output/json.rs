//! JSON Output Formatter
//!
//! Generates machine-readable JSON reports wrapping an `AuditStore`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::store::AuditStore;

/// Serialize an `AuditStore` directly to JSON.
pub fn format_json(store: &AuditStore, pretty: bool) -> Result<String> {
    let output = if pretty {
        serde_json::to_string_pretty(store)
    } else {
        serde_json::to_string(store)
    };

    output.map_err(|e| crate::error::AuditError::OutputError {
        reason: format!("JSON serialization failed: {}", e),
    })
}

/// Extended JSON report with tool metadata, mirroring the teacher's
/// `JsonReport` wrapper.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub metadata: ReportMetadata,
    pub store: AuditStore,
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub tool: String,
    pub timestamp: DateTime<Utc>,
}

impl JsonReport {
    pub fn new(store: AuditStore) -> Self {
        Self {
            metadata: ReportMetadata {
                tool: format!("auditcore v{}", env!("CARGO_PKG_VERSION")),
                timestamp: Utc::now(),
            },
            store,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };

        output.map_err(|e| crate::error::AuditError::OutputError {
            reason: format!("JSON serialization failed: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_store() -> AuditStore {
        AuditStore {
            version: "0.1.0".to_string(),
            revision: 1,
            options: serde_json::Map::new(),
            sitemap: vec!["https://example.com".to_string()],
            auditmap: vec!["https://example.com".to_string()],
            issues: vec![],
            plugin_results: HashMap::new(),
            progress: 100.0,
            status: "done".to_string(),
        }
    }

    #[test]
    fn test_format_json() {
        let json = format_json(&sample_store(), true).unwrap();
        assert!(json.contains("example.com"));
        assert!(json.contains("\"progress\": 100.0"));
    }

    #[test]
    fn test_json_report_with_metadata() {
        let json_report = JsonReport::new(sample_store());
        let output = json_report.to_json(true).unwrap();

        assert!(output.contains("auditcore"));
        assert!(output.contains("\"status\": \"done\""));
    }
}
