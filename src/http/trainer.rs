//! Trainer — collects pages synthesized by the HTTP engine that differ from
//! what was requested (redirect targets chiefly), so the orchestrator can
//! fold them into the sitemap without the spider having seen them directly
//! (spec §4.1, §4.3).

use tokio::sync::Mutex;

use crate::page::Page;

pub struct Trainer {
    pages: Mutex<Vec<Page>>,
}

impl Trainer {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_page(&self, page: Page) {
        self.pages.lock().await.push(page);
    }

    /// Drain and return all trainer-synthesized pages collected so far.
    pub async fn flush_pages(&self) -> Vec<Page> {
        let mut guard = self.pages.lock().await;
        std::mem::take(&mut *guard)
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new()
    }
}
