//! Module Registry & Dispatcher (C5)
//!
//! `trait Module` is object-safe via `#[async_trait]` (grounded in
//! `examples/imdanibytes-nexus` and `examples/jdsingh122918-forge`'s use of
//! the `async-trait` crate for trait objects with async methods). The
//! registry owns an append-only `IssueSink` and dispatches through
//! `fault_jail` so one bad module cannot take down a scan (spec §7).

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::fault_jail;
use crate::issue::Issue;
use crate::module::timing::TimingCoordinator;
use crate::options::Options;
use crate::page::{ElementKind, Page};
use crate::queue::QueueHandle;

/// Metadata describing a module, surfaced via `lsmod` (spec §4.4, §6).
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
    pub author: Vec<String>,
    pub elements: Vec<ElementKind>,
}

/// A pluggable security check. Implementations inspect a `Page` and push
/// findings onto the shared sink. `timing` lets a module register deferred
/// timing-attack operations to run in the second audit phase (spec §4.5).
/// `queues` is the module's write access into the orchestrator's work
/// queues (spec §4.4: "a reference to the orchestrator so the module can
/// push into queues") — a module that discovers a new URL or page pushes
/// it directly rather than returning it to the caller.
#[async_trait]
pub trait Module: Send + Sync {
    fn info(&self) -> &ModuleInfo;
    async fn run(
        &self,
        page: &Page,
        sink: &IssueSink,
        timing: &TimingCoordinator,
        queues: &QueueHandle,
    ) -> Result<()>;
}

/// Append-only collector for issues discovered during a scan, shared by all
/// concurrently-running modules (spec §5 shared-resource policy).
#[derive(Default)]
pub struct IssueSink {
    issues: Mutex<Vec<Issue>>,
}

impl IssueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, issue: Issue) {
        self.issues.lock().await.push(issue);
    }

    pub async fn snapshot(&self) -> Vec<Issue> {
        self.issues.lock().await.clone()
    }
}

/// A module entry as surfaced by `lsmod`.
#[derive(Debug, Clone)]
pub struct ModuleListing {
    pub name: String,
    pub description: String,
    pub author: Vec<String>,
}

pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
    sink: Arc<IssueSink>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            sink: Arc::new(IssueSink::new()),
        }
    }

    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    pub fn available(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Whether `module` applies to `page` under `options` — the applicability
    /// table of spec §4.4: a module runs on a page if the page exposes at
    /// least one of the module's target element classes and the
    /// corresponding element-class toggle is enabled. BODY/PATH/SERVER are
    /// always-on classes with no corresponding toggle.
    pub fn run_mod(&self, module: &dyn Module, page: &Page, options: &Options) -> bool {
        let elements = &module.info().elements;
        if elements.is_empty() {
            // spec §4.4: a module with no declared element classes always runs.
            return true;
        }
        elements.iter().any(|&kind| {
            if !page.has_element(kind) {
                return false;
            }
            match kind {
                ElementKind::Link => options.audit_links,
                ElementKind::Form => options.audit_forms,
                ElementKind::Cookie => options.audit_cookies,
                ElementKind::Header => options.audit_headers,
                ElementKind::Body | ElementKind::Path | ElementKind::Server => true,
            }
        })
    }

    /// Run a single module against a page, fault-isolated (spec §7). Returns
    /// `Ok(())` whether the module succeeded or faulted — a fault is logged
    /// and swallowed, never propagated to the orchestrator.
    pub async fn run_one(
        &self,
        module: &dyn Module,
        page: &Page,
        timing: &TimingCoordinator,
        queues: &QueueHandle,
    ) -> Result<()> {
        let label = format!("module:{}", module.info().name);
        let sink = self.sink.clone();
        fault_jail::run(&label, async move {
            debug!(module = %module.info().name, page = %page.url, "running module");
            module.run(page, &sink, timing, queues).await
        })
        .await?;
        Ok(())
    }

    pub fn results(&self) -> &IssueSink {
        &self.sink
    }

    pub async fn results_snapshot(&self) -> Vec<Issue> {
        self.sink.snapshot().await
    }

    /// List modules matching all given patterns (conjunctive AND, spec
    /// §4.4). Never mutates the registry — clearing is a separate explicit
    /// call (spec §9 Open Question resolution).
    pub fn list_filtered(&self, patterns: &[Regex]) -> Vec<ModuleListing> {
        self.modules
            .iter()
            .map(|m| m.info())
            .filter(|info| {
                patterns.iter().all(|p| {
                    p.is_match(&info.name)
                        || p.is_match(&info.description)
                        || info.author.iter().any(|a| p.is_match(a))
                })
            })
            .map(|info| ModuleListing {
                name: info.name.clone(),
                description: info.description.clone(),
                author: info.author.clone(),
            })
            .collect()
    }

    /// Explicitly empty the registry. Never called as a side effect of
    /// listing (spec §9 Open Question resolution).
    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
