//! Audit Store Builder (C9)
//!
//! The immutable report artifact, built on demand and cached until a caller
//! explicitly asks for a fresh rebuild (spec §4.1 `audit_store(fresh)`).
//! Modeled on the teacher's `AuditReport::new` + `with_*` builder chain in
//! `src/audit/report.rs`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::issue::Issue;
use crate::plugin::PluginOutput;

/// An immutable snapshot of a scan's results at the moment it was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStore {
    pub version: String,
    pub revision: u64,
    pub options: serde_json::Map<String, Value>,
    pub sitemap: Vec<String>,
    pub auditmap: Vec<String>,
    pub issues: Vec<Issue>,
    pub plugin_results: HashMap<String, PluginOutput>,
    pub progress: f64,
    pub status: String,
}

/// Builds `AuditStore` snapshots and caches the most recent one.
pub struct AuditStoreBuilder {
    revision: u64,
    cached: Option<AuditStore>,
}

impl AuditStoreBuilder {
    pub fn new() -> Self {
        Self {
            revision: 0,
            cached: None,
        }
    }

    /// Build (or return the cached) snapshot. Pass `fresh: true` to force a
    /// rebuild even if one is cached.
    pub fn build(
        &mut self,
        fresh: bool,
        options: serde_json::Map<String, Value>,
        sitemap: Vec<String>,
        auditmap: Vec<String>,
        issues: Vec<Issue>,
        plugin_results: HashMap<String, PluginOutput>,
        progress: f64,
        status: String,
    ) -> &AuditStore {
        if fresh || self.cached.is_none() {
            self.revision += 1;
            self.cached = Some(AuditStore {
                version: env!("CARGO_PKG_VERSION").to_string(),
                revision: self.revision,
                options,
                sitemap,
                auditmap,
                issues,
                plugin_results,
                progress,
                status,
            });
        }
        self.cached.as_ref().expect("just populated above")
    }

    pub fn cached(&self) -> Option<&AuditStore> {
        self.cached.as_ref()
    }
}

impl Default for AuditStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
