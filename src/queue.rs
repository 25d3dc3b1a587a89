//! Work Queues (C4) — two FIFO queues plus monotonic push counters
//!
//! `url_queue: FIFO<String>` and `page_queue: FIFO<Page>` (spec §3, §4.2).
//! `total_size` increments on every push and is never decremented; it feeds
//! the progress model (§4.6) and must never be used for queue sizing.
//!
//! `QueueHandle` is the write-only capability into both queues, shared by
//! modules and plugins (spec §4.4, §5).
//!
//! Modeled on the teacher's `BrowserPoolInner` (`src/browser/pool.rs`):
//! a `Mutex`-guarded collection plus an async notification primitive, here
//! generalized from a capacity-bounded resource pool to a plain FIFO.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::page::Page;

/// A thread-safe FIFO with blocking pop and non-blocking `is_empty`.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    total_size: AtomicUsize,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            total_size: AtomicUsize::new(0),
        })
    }

    /// Enqueue an item and increment the monotonic counter.
    pub async fn push(&self, item: T) {
        self.items.lock().await.push_back(item);
        self.total_size.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Enqueue an item without touching `total_size`. Used for the
    /// URL-queue-to-page-queue pipeline handoff: a page fetched from a URL
    /// already popped off `url_queue` is a continuation of that same
    /// discovered item, not a newly discovered one, so it must not be
    /// double-counted by the progress model's `sitemap_sz` (spec §4.6,
    /// §8 scenario 1). Genuinely new pages — trainer flushes, plugin or
    /// caller-initiated `push_page` — still go through `push`.
    pub async fn push_uncounted(&self, item: T) {
        self.items.lock().await.push_back(item);
        self.notify.notify_one();
    }

    /// Pop the next item, or `None` if the queue is currently empty.
    /// Non-blocking: callers that need to drain a batch poll this in a loop
    /// rather than waiting indefinitely, since the orchestrator treats queue
    /// exhaustion as a drain-to-quiescence signal, not a reason to block.
    pub async fn try_pop(&self) -> Option<T> {
        self.items.lock().await.pop_front()
    }

    /// Non-blocking emptiness check. Never used for queue sizing (spec §4.2) —
    /// only to decide whether the drain loop should keep iterating.
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Number of items ever pushed onto this queue. Monotone non-decreasing
    /// across the scan (spec §8).
    pub fn total_size(&self) -> usize {
        self.total_size.load(Ordering::SeqCst)
    }
}

pub type UrlQueue = WorkQueue<String>;
pub type PageQueue = WorkQueue<Page>;

/// Shared capability handle granting write access to the two work queues,
/// without exposing the rest of the orchestrator's locked state. Handed to
/// both modules (spec §4.4: "a reference to the orchestrator so the module
/// can push into queues") and plugins (spec §5: "plugins may mutate the
/// work queues") — the same least-privilege shape for both callers.
#[derive(Clone)]
pub struct QueueHandle {
    url_queue: Arc<UrlQueue>,
    page_queue: Arc<PageQueue>,
}

impl QueueHandle {
    pub fn new(url_queue: Arc<UrlQueue>, page_queue: Arc<PageQueue>) -> Self {
        Self {
            url_queue,
            page_queue,
        }
    }

    pub async fn push_url(&self, url: String) {
        self.url_queue.push(url).await;
    }

    pub async fn push_page(&self, page: Page) {
        self.page_queue.push(page).await;
    }
}
