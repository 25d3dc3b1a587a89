//! Audit Orchestrator (C7) — the heart
//!
//! Composes the HTTP engine, spider, module registry, timing coordinator,
//! and plugin manager into the `prepare → audit → cleanup` pipeline (spec
//! §4.1). Grounded in the teacher's `audit::batch` (concurrent task
//! spawning + progress callback) and `audit::pipeline` (single-page fetch →
//! parse → check composition) merged into one coordinating type.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::audit::state::{status_string, AuditState, PauseSet};
use crate::error::Result;
use crate::fault_jail;
use crate::http::engine::{Completion, FetchHint};
use crate::http::HttpEngine;
use crate::module::{Module, ModuleRegistry, TimingCoordinator};
use crate::options::{Options, RedundancyRule};
use crate::plugin::{Plugin, PluginHandle, PluginManager, PluginOutput};
use crate::progress::{compute_progress, estimate_eta_secs, ProgressInputs};
use crate::queue::{PageQueue, QueueHandle, UrlQueue, WorkQueue};
use crate::spider::{IndexSet, Spider};
use crate::store::{AuditStore, AuditStoreBuilder};

/// Query-parameter names the engine strips before issuing a request — the
/// scan-internal tracking params named in spec §4.1.
const DEFAULT_REMOVE_ID_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign"];

/// A flat snapshot of orchestrator counters, returned by `stats()`.
#[derive(Debug, Clone)]
pub struct Stats {
    pub request_count: usize,
    pub response_count: usize,
    pub time_out_count: usize,
    pub average_res_time_ms: f64,
    /// Average requests per second since the scan started (spec §4.1).
    pub requests_per_second: f64,
    /// Mean response time in ms across the burst harvested since the
    /// previous `stats()` call (spec §4.1's "current burst averages").
    pub current_burst_avg_ms: f64,
    pub sitemap_size: usize,
    pub auditmap_size: usize,
    pub progress: f64,
    pub max_concurrency: usize,
    pub current_url: Option<String>,
    /// Projected remaining time, derived from `progress` and elapsed time
    /// (spec §4.6). `None` before the scan has started or once it's done.
    pub eta_secs: Option<f64>,
}

pub struct Orchestrator {
    options: Options,
    url_queue: Arc<UrlQueue>,
    page_queue: Arc<PageQueue>,
    /// The queue-push capability handed to every dispatched module (spec
    /// §4.4: "a reference to the orchestrator so the module can push into
    /// queues") — the same `QueueHandle` shape plugins use.
    module_handle: QueueHandle,
    /// Mutable working copies of `options.redundant`'s visit counters;
    /// `options.redundant` itself stays untouched so the store can report
    /// the original limits (spec §4.1, §9).
    redundancy: Mutex<Vec<RedundancyRule>>,
    http_engine: Mutex<HttpEngine>,
    spider: Option<Arc<Spider>>,
    registry: Mutex<ModuleRegistry>,
    timing: Arc<TimingCoordinator>,
    plugins: Mutex<PluginManager>,
    pause_set: PauseSet,
    state: Mutex<AuditState>,
    sitemap: Mutex<IndexSet>,
    auditmap: Mutex<IndexSet>,
    running: AtomicBool,
    start_datetime: Mutex<Option<chrono::DateTime<Utc>>>,
    finish_datetime: Mutex<Option<chrono::DateTime<Utc>>>,
    current_url: Arc<Mutex<Option<String>>>,
    store_builder: Mutex<AuditStoreBuilder>,
}

impl Orchestrator {
    /// Construct a new orchestrator. Normalization of `options` (cookie
    /// parsing, user-agent suffixing, cookie-jar check) already happened in
    /// `Options::from_args`; this constructor only wires up collaborators.
    pub fn new(options: Options) -> Result<Self> {
        let http_engine = HttpEngine::new(&options)?;
        let url_queue = WorkQueue::new();
        let page_queue = WorkQueue::new();
        let module_handle = QueueHandle::new(url_queue.clone(), page_queue.clone());
        let redundancy = Mutex::new(options.redundant.clone());

        Ok(Self {
            url_queue,
            page_queue,
            module_handle,
            redundancy,
            options,
            http_engine: Mutex::new(http_engine),
            spider: None,
            registry: Mutex::new(ModuleRegistry::new()),
            timing: TimingCoordinator::new(),
            plugins: Mutex::new(PluginManager::new()),
            pause_set: PauseSet::new(),
            state: Mutex::new(AuditState::Ready),
            sitemap: Mutex::new(IndexSet::new()),
            auditmap: Mutex::new(IndexSet::new()),
            running: AtomicBool::new(false),
            start_datetime: Mutex::new(None),
            finish_datetime: Mutex::new(None),
            current_url: Arc::new(Mutex::new(None)),
            store_builder: Mutex::new(AuditStoreBuilder::new()),
        })
    }

    /// Construct with an explicit target URL driving the spider (used when
    /// `restrict_paths` is empty and spider-driven discovery is wanted).
    pub fn with_spider(options: Options, target: &str) -> Result<Self> {
        let mut orchestrator = Self::new(options)?;
        if orchestrator.options.restrict_paths.is_empty() {
            orchestrator.spider =
                Some(Arc::new(Spider::new(target, &orchestrator.options.user_agent)?));
        }
        Ok(orchestrator)
    }

    pub fn register_module(&self, module: Arc<dyn Module>) {
        if let Ok(mut registry) = self.registry.try_lock() {
            registry.register(module);
        }
    }

    pub async fn register_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.plugins.lock().await.register(plugin);
    }

    /// `prepare()`: marks the scan running, records the start time, and
    /// starts plugins against this orchestrator's queues (spec §4.1).
    pub async fn prepare(&self) {
        self.running.store(true, Ordering::SeqCst);
        *self.start_datetime.lock().await = Some(Utc::now());

        let handle = Arc::new(PluginHandle::new(self.url_queue.clone(), self.page_queue.clone()));
        self.plugins.lock().await.start(handle);
    }

    /// `run()`: `prepare → audit → cleanup → hook → normalize cookies →
    /// reports`. Both `audit` and the hook run inside the fault jail so a
    /// hard failure still yields a degraded-but-complete report (spec
    /// §4.1, §7).
    pub async fn run<F>(&self, after_audit_hook: Option<F>) -> Result<AuditStore>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        self.prepare().await;

        // `fault_jail::run` never surfaces `Err` itself — a fault inside
        // `audit()` is already logged there and reduced to `Ok(None)`.
        if let Ok(None) = fault_jail::run("audit", self.audit()).await {
            warn!("audit pipeline fault, proceeding to cleanup with partial results");
        }

        if let Some(hook) = after_audit_hook {
            let _ = fault_jail::run("after_audit_hook", hook).await;
        }

        self.clean_up(false).await;

        Ok(self.audit_store(false).await)
    }

    /// `audit()` body per spec §4.1.
    pub async fn audit(&self) -> Result<()> {
        self.wait_if_paused().await;
        *self.state.lock().await = AuditState::Crawling;

        if !self.options.restrict_paths.is_empty() {
            for raw in self.options.restrict_paths.clone() {
                let normalized = normalize_url(&raw);
                if !self.redundancy_allows(&normalized).await {
                    continue;
                }
                self.sitemap.lock().await.insert(normalized.clone());
                self.url_queue.push(normalized).await;
            }
        } else if let Some(spider) = self.spider.clone() {
            let discovered: std::sync::Mutex<Vec<String>> = std::sync::Mutex::new(Vec::new());
            spider
                .run(|url| {
                    discovered.lock().expect("spider discovery mutex poisoned").push(url.to_string());
                })
                .await?;

            let discovered = discovered.into_inner().expect("spider discovery mutex poisoned");
            for url in discovered {
                if !self.redundancy_allows(&url).await {
                    continue;
                }
                self.sitemap.lock().await.insert(url.clone());
                self.url_queue.push(url).await;
            }

            let spider_sitemap = spider.sitemap().await;
            let mut sitemap = self.sitemap.lock().await;
            for url in spider_sitemap.iter() {
                sitemap.insert(url.clone());
            }
        }

        *self.state.lock().await = AuditState::Auditing;
        self.audit_queue().await?;

        if self.timing.has_loaded_modules().await {
            info!("starting timing-attack phase");
            let current_url = self.current_url.clone();
            self.timing.set_on_timing_attacks(move |block| {
                if !block.url.is_empty() {
                    if let Ok(mut guard) = current_url.try_lock() {
                        *guard = Some(block.url.clone());
                    }
                }
            });
            self.timing.timeout_audit_run().await;
            self.audit_queue().await?;
        }

        Ok(())
    }

    /// Drain both queues to quiescence, honoring `http_harvest_last` (spec
    /// §4.1).
    pub async fn audit_queue(&self) -> Result<()> {
        loop {
            while let Some(url) = self.url_queue.try_pop().await {
                self.wait_if_paused().await;
                *self.current_url.lock().await = Some(url.clone());

                let hint = FetchHint {
                    remove_id: DEFAULT_REMOVE_ID_PARAMS.iter().map(|s| s.to_string()).collect(),
                };
                let mut engine = self.http_engine.lock().await;
                engine.get(url, hint);

                if !self.options.http_harvest_last {
                    let completions = engine.run().await;
                    drop(engine);
                    self.handle_completions(completions).await;
                    self.audit_page_queue().await?;
                }
            }

            if self.options.http_harvest_last {
                let completions = {
                    let mut engine = self.http_engine.lock().await;
                    engine.run().await
                };
                self.handle_completions(completions).await;
            }

            self.audit_page_queue().await?;

            // Final harvest absorbs any pages the trainer produced while we
            // were draining the page queue; idempotent if nothing is
            // outstanding (spec §5 ordering guarantee, §8 idempotence).
            let trailing = {
                let mut engine = self.http_engine.lock().await;
                engine.run().await
            };
            self.handle_completions(trailing).await;
            self.audit_page_queue().await?;

            if self.url_queue.is_empty().await && self.page_queue.is_empty().await {
                break;
            }
        }

        Ok(())
    }

    /// `audit_page_queue()`: drain only the page queue, running modules
    /// against each page. Does not pop URLs (spec §4.1).
    pub async fn audit_page_queue(&self) -> Result<()> {
        while let Some(page) = self.page_queue.try_pop().await {
            self.wait_if_paused().await;
            let registry = self.registry.lock().await;
            for module in registry.available() {
                if registry.run_mod(module.as_ref(), &page, &self.options) {
                    registry
                        .run_one(module.as_ref(), &page, &self.timing, &self.module_handle)
                        .await?;
                }
            }
            drop(registry);
            self.auditmap.lock().await.insert(page.url.clone());

            let trainer_pages = {
                let engine = self.http_engine.lock().await;
                engine.trainer().flush_pages().await
            };
            for trainer_page in trainer_pages {
                self.sitemap.lock().await.insert(trainer_page.url.clone());
                self.page_queue.push(trainer_page).await;
            }
        }
        Ok(())
    }

    /// Fold harvested completions into the page queue. These pages
    /// originated from URLs already counted by `url_queue.total_size`
    /// (spec §4.1 step), so they're handed off via `push_uncounted` rather
    /// than `push` — otherwise every URL would count twice toward
    /// `sitemap_sz` in the progress model (spec §4.6, §8 scenario 1).
    async fn handle_completions(&self, completions: Vec<Completion>) {
        for (url, outcome) in completions {
            match outcome {
                Ok(page) => {
                    self.sitemap.lock().await.insert(page.url.clone());
                    self.page_queue.push_uncounted(page).await;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "fetch failed, logged and skipped");
                }
            }
        }
    }

    /// Enqueue a URL directly (e.g. from a CLI front-end or a plugin that
    /// isn't using `PluginHandle`). Silently dropped if a redundancy rule
    /// has exhausted its visit limit for this URL.
    pub async fn push_url(&self, url: String) {
        if !self.redundancy_allows(&url).await {
            return;
        }
        self.sitemap.lock().await.insert(url.clone());
        self.url_queue.push(url).await;
    }

    /// Consult `options.redundant` before enqueueing a URL: a URL matching
    /// a rule's pattern past its visit limit is not re-enqueued (spec §4.1,
    /// §9). A rule whose pattern fails to compile as a regex never matches.
    async fn redundancy_allows(&self, url: &str) -> bool {
        let mut rules = self.redundancy.lock().await;
        for rule in rules.iter_mut() {
            let Ok(re) = Regex::new(&rule.pattern) else {
                continue;
            };
            if re.is_match(url) && !rule.record_and_check() {
                return false;
            }
        }
        true
    }

    /// Enqueue a page directly — the orchestrator-level equivalent of a
    /// trainer injection.
    pub async fn push_page(&self, page: crate::page::Page) {
        self.sitemap.lock().await.insert(page.url.clone());
        self.page_queue.push(page).await;
    }

    /// Pause the scan on behalf of `token`. Multi-source: the scan stays
    /// paused until every token that paused it has resumed (spec §5, §9).
    pub async fn pause(&self, token: impl Into<String>) {
        self.pause_set.pause(token).await;
        if let Some(spider) = &self.spider {
            spider.pause();
        }
    }

    pub async fn resume(&self, token: &str) {
        self.pause_set.resume(token).await;
        if !self.pause_set.is_paused().await {
            if let Some(spider) = &self.spider {
                spider.resume();
            }
        }
    }

    pub async fn paused(&self) -> bool {
        self.pause_set.is_paused().await
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> String {
        let state = *self.state.lock().await;
        status_string(state, &self.pause_set).await
    }

    /// Poll at a safe point (between modules and between queue items, spec
    /// §5) and block while paused.
    async fn wait_if_paused(&self) {
        while self.pause_set.is_paused().await {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    /// `stats()`: progress model (§4.6) plus a flat counter snapshot.
    pub async fn stats(&self) -> Stats {
        let sitemap_total = self.url_queue.total_size() + self.page_queue.total_size();
        let redirects = match &self.spider {
            Some(spider) => spider.redirects().await.len(),
            None => 0,
        };
        let effective = sitemap_total.saturating_sub(redirects);
        let audited = self.auditmap.lock().await.len();

        let timing_loaded = self.timing.has_loaded_modules().await;
        let timing_total = self.timing.total_operations();
        let timing_remaining = self.timing.remaining_operations();
        let timing_done = timing_total.saturating_sub(timing_remaining);

        let progress = compute_progress(&ProgressInputs {
            audited,
            effective,
            timing_done,
            timing_total,
            timing_modules_loaded: timing_loaded,
        });

        let engine = self.http_engine.lock().await;
        let engine_stats = engine.stats();
        let current_burst_avg_ms = engine_stats.burst_average_res_time_ms();
        engine_stats.reset_burst();

        let elapsed_secs = self
            .start_datetime
            .lock()
            .await
            .map(|started| (Utc::now() - started).num_milliseconds() as f64 / 1000.0)
            .filter(|secs| *secs > 0.0);
        let requests_per_second = match elapsed_secs {
            Some(secs) => engine_stats.response_count.load(Ordering::SeqCst) as f64 / secs,
            None => 0.0,
        };
        let eta_secs = elapsed_secs.and_then(|secs| estimate_eta_secs(progress, secs));

        Stats {
            request_count: engine_stats.request_count.load(Ordering::SeqCst),
            response_count: engine_stats.response_count.load(Ordering::SeqCst),
            time_out_count: engine_stats.time_out_count.load(Ordering::SeqCst),
            average_res_time_ms: engine_stats.average_res_time_ms(),
            requests_per_second,
            current_burst_avg_ms,
            sitemap_size: self.sitemap.lock().await.len(),
            auditmap_size: audited,
            progress,
            max_concurrency: engine.max_concurrency(),
            current_url: self.current_url.lock().await.clone(),
            eta_secs,
        }
    }

    /// The crate version this orchestrator was built from (spec §6).
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// The revision counter of the most recently built `AuditStore`
    /// snapshot, or 0 if `audit_store()` has never been called (spec §6).
    pub async fn revision(&self) -> u64 {
        self.store_builder
            .lock()
            .await
            .cached()
            .map(|store| store.revision)
            .unwrap_or(0)
    }

    /// `clean_up(skip_audit_queue)`: spec §4.1.
    pub async fn clean_up(&self, skip_audit_queue: bool) {
        *self.state.lock().await = AuditState::Cleanup;

        let start = *self.start_datetime.lock().await;
        let finish = Utc::now();
        *self.finish_datetime.lock().await = Some(finish);
        if let Some(start) = start {
            let _delta = finish.signed_duration_since(start).num_milliseconds();
        }

        self.running.store(false, Ordering::SeqCst);

        // Block on plugins to completion — suspension point (c), spec §5.
        // Plugins were spawned in `prepare()`; this awaits those tasks.
        self.plugins.lock().await.block().await;

        if !skip_audit_queue {
            let _ = self.audit_queue().await;
        }

        *self.state.lock().await = AuditState::Done;
        self.audit_store(true).await;
    }

    /// `audit_store(fresh)`: build (or return the cached) immutable report
    /// snapshot. Returns an owned clone so callers aren't tied to the
    /// builder's internal lock.
    pub async fn audit_store(&self, fresh: bool) -> AuditStore {
        let options_map = self.options_summary().as_object().cloned().unwrap_or_default();

        let sitemap: Vec<String> = self.sitemap.lock().await.iter().cloned().collect();
        let auditmap: Vec<String> = self.auditmap.lock().await.iter().cloned().collect();
        let issues = self.registry.lock().await.results_snapshot().await;
        let plugin_results: std::collections::HashMap<String, PluginOutput> =
            self.plugins.lock().await.results().clone();
        let progress = self.stats().await.progress;
        let status = self.status().await;

        let mut builder = self.store_builder.lock().await;
        builder
            .build(
                fresh,
                options_map,
                sitemap,
                auditmap,
                issues,
                plugin_results,
                progress,
                status,
            )
            .clone()
    }

    fn options_summary(&self) -> serde_json::Value {
        // `self.options.redundant` holds the original rules, never mutated —
        // the live visit counters live in `self.redundancy` instead (spec
        // §4.1, §9: the store must report the original limits).
        let redundant: Vec<serde_json::Value> = self
            .options
            .redundant
            .iter()
            .map(|rule| serde_json::json!({"pattern": rule.pattern, "limit": rule.limit}))
            .collect();

        serde_json::json!({
            "restrict_paths": self.options.restrict_paths,
            "audit_links": self.options.audit_links,
            "audit_forms": self.options.audit_forms,
            "audit_cookies": self.options.audit_cookies,
            "audit_headers": self.options.audit_headers,
            "http_harvest_last": self.options.http_harvest_last,
            "user_agent": self.options.user_agent,
            "concurrency": self.options.concurrency,
            "redundant": redundant,
        })
    }

}

fn normalize_url(raw: &str) -> String {
    url::Url::parse(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}
