//! Spider (C2) — minimal same-host link discovery collaborator.
//!
//! The real crawler is explicitly out of scope (spec §1 Non-goals); this
//! module exists to satisfy the orchestrator's "otherwise start the spider"
//! branch (spec §4.1) with a small, concrete implementation. Grounded in
//! `examples/other_examples/..._riptidecrawler__crates-riptide-core-src-spider-core.rs`'s
//! `Spider::new`/`crawl` shape and its `Arc<RwLock<CrawlState>>` pattern,
//! scaled down from a full frontier/budget/circuit-breaker engine to a
//! single same-host BFS.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;

/// Ordered, de-duplicated URL collection (insertion order preserved).
#[derive(Debug, Default, Clone)]
pub struct IndexSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url`; returns `true` if it was newly added.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.insert(url.clone()) {
            self.order.push(url);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

struct CrawlState {
    sitemap: IndexSet,
    redirects: HashSet<String>,
}

/// A deliberately small same-host crawler: fetch, extract `<a href>`, filter
/// to the seed's host, repeat.
pub struct Spider {
    client: Client,
    seed: String,
    state: Arc<RwLock<CrawlState>>,
    paused: Arc<AtomicBool>,
}

impl Spider {
    pub fn new(seed: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent.to_string()).build()?;
        Ok(Self {
            client,
            seed: seed.into(),
            state: Arc::new(RwLock::new(CrawlState {
                sitemap: IndexSet::new(),
                redirects: HashSet::new(),
            })),
            paused: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Crawl same-host pages starting at the seed, invoking `per_response_hook`
    /// for every discovered URL (the outbound "per response hook" interface,
    /// spec §6). Checks the pause flag between fetches.
    pub async fn run<F>(&self, mut per_response_hook: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        let seed_host = url::Url::parse(&self.seed).ok().and_then(|u| u.host_str().map(String::from));

        let mut frontier: Vec<String> = vec![self.seed.clone()];
        let mut visited = HashSet::new();

        while let Some(current) = frontier.pop() {
            while self.paused.load(Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }

            if !visited.insert(current.clone()) {
                continue;
            }

            {
                let mut state = self.state.write().await;
                state.sitemap.insert(current.clone());
            }
            per_response_hook(&current);

            let response = match self.client.get(&current).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    debug!(url = %current, error = %e, "spider fetch failed, skipping");
                    continue;
                }
            };

            let final_url = response.url().to_string();
            if final_url != current {
                self.state.write().await.redirects.insert(current.clone());
            }

            let body = match response.text().await {
                Ok(b) => b,
                Err(_) => continue,
            };

            for link in extract_links(&body, &final_url) {
                let same_host = url::Url::parse(&link)
                    .ok()
                    .and_then(|u| u.host_str().map(String::from))
                    == seed_host;
                if same_host && !visited.contains(&link) {
                    frontier.push(link);
                }
            }
        }

        Ok(())
    }

    pub async fn sitemap(&self) -> IndexSet {
        self.state.read().await.sitemap.clone()
    }

    pub async fn redirects(&self) -> HashSet<String> {
        self.state.read().await.redirects.clone()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

fn extract_links(body: &str, base_url: &str) -> Vec<String> {
    let selector = Selector::parse("a[href]").expect("static selector is valid");
    let document = Html::parse_document(body);
    let base = url::Url::parse(base_url).ok();

    document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            base.as_ref()
                .and_then(|b| b.join(href).ok())
                .map(|u| u.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_set_dedup_preserves_order() {
        let mut set = IndexSet::new();
        assert!(set.insert("a".to_string()));
        assert!(set.insert("b".to_string()));
        assert!(!set.insert("a".to_string()));
        assert_eq!(set.as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_extract_links_resolves_relative() {
        let body = r#"<a href="/about">About</a><a href="https://other.com/x">X</a>"#;
        let links = extract_links(body, "https://example.com/");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "https://example.com/about");
        assert_eq!(links[1], "https://other.com/x");
    }

    #[tokio::test]
    async fn test_pause_resume_flag() {
        let spider = Spider::new("https://example.com", "test-agent").unwrap();
        assert!(!spider.is_paused());
        spider.pause();
        assert!(spider.is_paused());
        spider.resume();
        assert!(!spider.is_paused());
    }
}
