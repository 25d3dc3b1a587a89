//! Timing-Attack Coordinator (C6)
//!
//! A second, deferred audit phase for modules that need repeated timed
//! requests (e.g. blind timing side-channels) rather than a single page
//! visit (spec §4.5). Kept separate from the regular page-queue drain so its
//! progress can be tracked and reported independently (spec §4.6).

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

/// A unit of deferred timing work: a module name and the page URL it
/// should be re-probed against.
#[derive(Debug, Clone)]
pub struct TimingBlock {
    pub module: String,
    pub url: String,
}

type TimingCallback = Box<dyn Fn(&TimingBlock) + Send + Sync>;

pub struct TimingCoordinator {
    /// Names of modules that requested the timing phase.
    timeout_loaded_modules: Mutex<HashSet<String>>,
    timeout_audit_blocks: Mutex<VecDeque<TimingBlock>>,
    timeout_audit_operations_cnt: AtomicUsize,
    current_timeout_audit_operations_cnt: AtomicUsize,
    running_timeout_attacks: AtomicBool,
    on_timing_attacks: Mutex<Option<TimingCallback>>,
}

impl TimingCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            timeout_loaded_modules: Mutex::new(HashSet::new()),
            timeout_audit_blocks: Mutex::new(VecDeque::new()),
            timeout_audit_operations_cnt: AtomicUsize::new(0),
            current_timeout_audit_operations_cnt: AtomicUsize::new(0),
            running_timeout_attacks: AtomicBool::new(false),
            on_timing_attacks: Mutex::new(None),
        })
    }

    pub async fn register_module(&self, module_name: impl Into<String>) {
        self.timeout_loaded_modules
            .lock()
            .await
            .insert(module_name.into());
    }

    pub async fn has_loaded_modules(&self) -> bool {
        !self.timeout_loaded_modules.lock().await.is_empty()
    }

    pub async fn enqueue(&self, block: TimingBlock) {
        self.timeout_audit_blocks.lock().await.push_back(block);
        self.timeout_audit_operations_cnt
            .fetch_add(1, Ordering::SeqCst);
        self.current_timeout_audit_operations_cnt
            .fetch_add(1, Ordering::SeqCst);
    }

    pub fn set_on_timing_attacks<F>(&self, callback: F)
    where
        F: Fn(&TimingBlock) + Send + Sync + 'static,
    {
        if let Ok(mut guard) = self.on_timing_attacks.try_lock() {
            *guard = Some(Box::new(callback));
        }
    }

    pub fn total_operations(&self) -> usize {
        self.timeout_audit_operations_cnt.load(Ordering::SeqCst)
    }

    pub fn remaining_operations(&self) -> usize {
        self.current_timeout_audit_operations_cnt
            .load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running_timeout_attacks.load(Ordering::SeqCst)
    }

    /// Drain `timeout_audit_blocks` to completion, invoking the registered
    /// callback for every block and decrementing the remaining-ops counter.
    pub async fn timeout_audit_run(&self) {
        if !self.has_loaded_modules().await {
            return;
        }

        self.running_timeout_attacks.store(true, Ordering::SeqCst);

        loop {
            let block = self.timeout_audit_blocks.lock().await.pop_front();
            let Some(block) = block else { break };

            if let Some(callback) = self.on_timing_attacks.lock().await.as_ref() {
                callback(&block);
            }

            self.current_timeout_audit_operations_cnt
                .fetch_sub(1, Ordering::SeqCst);
        }

        self.running_timeout_attacks.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as StdAtomicUsize;

    #[tokio::test]
    async fn test_timeout_audit_run_drains_and_invokes_callback() {
        let coordinator = TimingCoordinator::new();
        coordinator.register_module("timing-probe").await;
        coordinator
            .enqueue(TimingBlock {
                module: "timing-probe".to_string(),
                url: "https://example.com/login".to_string(),
            })
            .await;
        coordinator
            .enqueue(TimingBlock {
                module: "timing-probe".to_string(),
                url: "https://example.com/reset".to_string(),
            })
            .await;

        let invocations = Arc::new(StdAtomicUsize::new(0));
        let invocations_clone = invocations.clone();
        coordinator.set_on_timing_attacks(move |_block| {
            invocations_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(coordinator.total_operations(), 2);
        coordinator.timeout_audit_run().await;

        assert_eq!(invocations.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.remaining_operations(), 0);
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_no_loaded_modules_is_a_noop() {
        let coordinator = TimingCoordinator::new();
        coordinator
            .enqueue(TimingBlock {
                module: "m".to_string(),
                url: "u".to_string(),
            })
            .await;
        coordinator.timeout_audit_run().await;
        // Nothing registered timing interest, so the queue is left untouched.
        assert_eq!(coordinator.remaining_operations(), 1);
    }
}
