//! Plugin Manager (C8)
//!
//! Plugins are longer-running collaborators that may mutate the work queues
//! directly (spec §1, §5) rather than simply inspecting a page, e.g. a
//! credential-stuffing plugin that pushes freshly discovered authenticated
//! URLs back onto the queue. Dispatched via `JoinSet` and fault-isolated
//! exactly like modules (spec §7 Plugin fault row). Queue access is the
//! shared `QueueHandle` (`queue.rs`) — the same capability `Module::run`
//! receives (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::Result;
use crate::fault_jail;
use crate::queue::QueueHandle;

/// Handle a plugin uses to reach into the orchestrator's queues.
pub type PluginHandle = QueueHandle;

/// Free-form result a plugin reports back, e.g. counts or a summary blob.
pub type PluginOutput = Value;

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, handle: &PluginHandle) -> Result<PluginOutput>;
}

pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    results: HashMap<String, PluginOutput>,
    in_flight: JoinSet<(String, Result<Option<PluginOutput>>)>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            results: HashMap::new(),
            in_flight: JoinSet::new(),
        }
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Whether any plugins matching all given patterns are loaded, for
    /// `lsplug` listing (spec §4.4 applied to plugins).
    pub fn list_filtered(&self, patterns: &[regex::Regex]) -> Vec<String> {
        self.plugins
            .iter()
            .map(|p| p.name().to_string())
            .filter(|name| patterns.iter().all(|p| p.is_match(name)))
            .collect()
    }

    /// Spawn every registered plugin against `handle` as an independent
    /// background task and return immediately — plugins run concurrently
    /// with the rest of the scan (spec §5). Call `block()` to await them.
    pub fn start(&mut self, handle: Arc<PluginHandle>) {
        for plugin in self.plugins.clone() {
            let handle = handle.clone();
            let name = plugin.name().to_string();
            self.in_flight.spawn(async move {
                let label = format!("plugin:{}", name);
                let handle_ref = handle;
                let outcome = fault_jail::run(&label, async move {
                    debug!(plugin = %name, "running plugin");
                    plugin.run(&handle_ref).await
                })
                .await;
                (plugin_name_from_label(&label), outcome)
            });
        }
    }

    /// Await every plugin spawned via `start()` to completion. Suspension
    /// point (c) of spec §5, called during `clean_up`. Idempotent once
    /// nothing is outstanding.
    pub async fn block(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Ok((name, Ok(Some(output)))) = joined {
                self.results.insert(name, output);
            }
        }
    }

    pub fn results(&self) -> &HashMap<String, PluginOutput> {
        &self.results
    }
}

fn plugin_name_from_label(label: &str) -> String {
    label.trim_start_matches("plugin:").to_string()
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::WorkQueue;

    struct EchoPlugin;

    #[async_trait]
    impl Plugin for EchoPlugin {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, handle: &PluginHandle) -> Result<PluginOutput> {
            handle.push_url("https://example.com/from-plugin".to_string()).await;
            Ok(serde_json::json!({"pushed": 1}))
        }
    }

    struct PanicPlugin;

    #[async_trait]
    impl Plugin for PanicPlugin {
        fn name(&self) -> &str {
            "panics"
        }

        async fn run(&self, _handle: &PluginHandle) -> Result<PluginOutput> {
            panic!("plugin exploded");
        }
    }

    #[tokio::test]
    async fn test_plugin_can_push_url_via_handle() {
        let url_queue = WorkQueue::new();
        let page_queue = WorkQueue::new();
        let handle = Arc::new(PluginHandle::new(url_queue.clone(), page_queue));

        let mut manager = PluginManager::new();
        manager.register(Arc::new(EchoPlugin));
        manager.start(handle);
        manager.block().await;

        assert_eq!(url_queue.total_size(), 1);
        assert_eq!(
            manager.results().get("echo").unwrap()["pushed"],
            serde_json::json!(1)
        );
    }

    #[tokio::test]
    async fn test_plugin_fault_is_isolated() {
        let url_queue = WorkQueue::new();
        let page_queue = WorkQueue::new();
        let handle = Arc::new(PluginHandle::new(url_queue, page_queue));

        let mut manager = PluginManager::new();
        manager.register(Arc::new(PanicPlugin));
        manager.start(handle);
        manager.block().await;

        assert!(manager.results().get("panics").is_none());
    }

    #[test]
    fn test_list_filtered() {
        let mut manager = PluginManager::new();
        manager.register(Arc::new(EchoPlugin));
        let patterns = vec![regex::Regex::new("echo").unwrap()];
        assert_eq!(manager.list_filtered(&patterns), vec!["echo".to_string()]);
    }
}
