//! HTTP Engine (C1) — concurrency-bounded fetch layer
//!
//! Grounded in the teacher's `BrowserPool` (`src/browser/pool.rs`): a
//! `Semaphore` bounds concurrent in-flight work, an atomic counter tracks
//! throughput, and completions are returned through an explicit channel
//! rather than a per-request callback closure — the "Callbacks from HTTP
//! engine → explicit queue" redesign.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use reqwest::cookie::Jar;
use reqwest::Client;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{AuditError, Result};
use crate::http::trainer::Trainer;
use crate::options::Options;
use crate::page::{Header, Page};

/// Per-request hints that adjust how the engine issues a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchHint {
    /// Query parameter names to strip before the request is sent (spec §4.1).
    pub remove_id: Vec<String>,
}

/// Throughput and outcome counters, mirroring the teacher's
/// `BrowserPoolInner::pages_created: AtomicUsize` idiom.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub request_count: AtomicUsize,
    pub response_count: AtomicUsize,
    pub time_out_count: AtomicUsize,
    pub curr_res_time_ms: AtomicU64,
    pub curr_res_cnt: AtomicUsize,
    /// Accumulated since the last `reset_burst()` call — the orchestrator's
    /// `stats()` reads and resets this every poll, so it reflects response
    /// times since the previous poll rather than the scan's lifetime average.
    burst_res_time_ms: AtomicU64,
    burst_res_cnt: AtomicUsize,
}

impl EngineStats {
    /// Mean response time in milliseconds across all completed responses.
    pub fn average_res_time_ms(&self) -> f64 {
        let cnt = self.curr_res_cnt.load(Ordering::SeqCst);
        if cnt == 0 {
            return 0.0;
        }
        self.curr_res_time_ms.load(Ordering::SeqCst) as f64 / cnt as f64
    }

    /// Mean response time in milliseconds across the current burst (spec
    /// §4.1's "current burst averages"), i.e. since the last `reset_burst()`.
    pub fn burst_average_res_time_ms(&self) -> f64 {
        let cnt = self.burst_res_cnt.load(Ordering::SeqCst);
        if cnt == 0 {
            return 0.0;
        }
        self.burst_res_time_ms.load(Ordering::SeqCst) as f64 / cnt as f64
    }

    /// Start a new burst window.
    pub fn reset_burst(&self) {
        self.burst_res_cnt.store(0, Ordering::SeqCst);
        self.burst_res_time_ms.store(0, Ordering::SeqCst);
    }
}

/// A single harvested completion: the URL requested and its outcome.
pub type Completion = (String, Result<Page>);

/// Concurrency-bounded HTTP fetch layer.
pub struct HttpEngine {
    client: Client,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    timeout_secs: u64,
    stats: Arc<EngineStats>,
    trainer: Arc<Trainer>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: JoinSet<()>,
}

impl HttpEngine {
    pub fn new(options: &Options) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        for cookie in &options.cookies {
            if let Ok(scope_url) = reqwest::Url::parse(&cookie.scope) {
                jar.add_cookie_str(&format!("{}={}", cookie.name, cookie.value), &scope_url);
            } else {
                warn!(
                    scope = %cookie.scope,
                    name = %cookie.name,
                    "cookie scope is not a URL, not seeding into the HTTP client"
                );
            }
        }

        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(std::time::Duration::from_secs(options.timeout_secs))
            .cookie_provider(jar)
            .build()
            .map_err(AuditError::HttpError)?;

        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(options.concurrency)),
            max_concurrency: options.concurrency,
            timeout_secs: options.timeout_secs,
            stats: Arc::new(EngineStats::default()),
            trainer: Arc::new(Trainer::new()),
            tx,
            rx,
            in_flight: JoinSet::new(),
        })
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Issue a fetch; the completion is pushed onto the internal channel
    /// rather than invoked as a callback (spec §9 redesign). Applies
    /// `hint.remove_id` to strip tracking query parameters before sending.
    pub fn get(&mut self, url: String, hint: FetchHint) {
        let cleaned = strip_query_params(&url, &hint.remove_id);
        let client = self.client.clone();
        let semaphore = self.semaphore.clone();
        let stats = self.stats.clone();
        let trainer = self.trainer.clone();
        let tx = self.tx.clone();
        let timeout_secs = self.timeout_secs;

        self.stats.request_count.fetch_add(1, Ordering::SeqCst);

        self.in_flight.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let started = Instant::now();
            let requested_url = cleaned.clone();
            let outcome = fetch_one(&client, &cleaned, timeout_secs).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            stats.response_count.fetch_add(1, Ordering::SeqCst);
            stats.curr_res_cnt.fetch_add(1, Ordering::SeqCst);
            stats
                .curr_res_time_ms
                .fetch_add(elapsed_ms, Ordering::SeqCst);
            stats.burst_res_cnt.fetch_add(1, Ordering::SeqCst);
            stats
                .burst_res_time_ms
                .fetch_add(elapsed_ms, Ordering::SeqCst);

            if matches!(outcome, Err(AuditError::RequestTimeout { .. })) {
                stats.time_out_count.fetch_add(1, Ordering::SeqCst);
            }

            if let Ok(ref page) = outcome {
                if page.url != requested_url {
                    trainer.push_page(page.clone()).await;
                }
            }

            let _ = tx.send((requested_url, outcome));
        });
    }

    /// Await all outstanding fetches and drain the completion channel.
    /// Aliased conceptually as `harvest()` (spec §4.3): synchronous
    /// harvesting of everything dispatched via `get()` so far.
    pub async fn run(&mut self) -> Vec<Completion> {
        while self.in_flight.join_next().await.is_some() {}

        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            completions.push(completion);
        }
        completions
    }

    /// Alias for `run()`, matching the teacher's batch-harvesting naming.
    pub async fn harvest(&mut self) -> Vec<Completion> {
        self.run().await
    }
}

async fn fetch_one(client: &Client, url: &str, timeout_secs: u64) -> Result<Page> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AuditError::RequestTimeout {
                url: url.to_string(),
                timeout_secs,
            }
        } else {
            AuditError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();

    let headers: Vec<Header> = response
        .headers()
        .iter()
        .map(|(name, value)| Header {
            name: name.to_string(),
            value: value.to_str().unwrap_or("").to_string(),
        })
        .collect();

    let set_cookie_values: Vec<String> = headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case("set-cookie"))
        .map(|h| h.value.clone())
        .collect();

    let body = response.text().await.map_err(|e| AuditError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    debug!(url = %final_url, status, "fetched page");

    Ok(Page::from_http_response(
        &final_url,
        status,
        &headers,
        &set_cookie_values,
        body,
    ))
}

/// Strip the named query parameters from `url` (spec §4.1's `remove_id`
/// hint). Falls back to the original string if `url` does not parse.
fn strip_query_params(url: &str, remove: &[String]) -> String {
    if remove.is_empty() {
        return url.to_string();
    }
    let Ok(mut parsed) = url::Url::parse(url) else {
        warn!(url, "could not parse URL to strip query params, using as-is");
        return url.to_string();
    };

    let remaining: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !remove.iter().any(|r| r == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if remaining.is_empty() {
        parsed.set_query(None);
    } else {
        let query = remaining
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_query_params_removes_named_param() {
        let stripped = strip_query_params(
            "https://example.com/page?utm_source=x&id=5",
            &["utm_source".to_string()],
        );
        assert_eq!(stripped, "https://example.com/page?id=5");
    }

    #[test]
    fn test_strip_query_params_noop_when_empty() {
        let url = "https://example.com/page?a=1";
        assert_eq!(strip_query_params(url, &[]), url);
    }

    #[test]
    fn test_average_res_time_zero_when_no_responses() {
        let stats = EngineStats::default();
        assert_eq!(stats.average_res_time_ms(), 0.0);
    }

    #[test]
    fn test_new_seeds_cookies_without_erroring() {
        let options = Options {
            cookies: vec![crate::page::Cookie {
                name: "session".to_string(),
                value: "abc123".to_string(),
                scope: "https://example.com".to_string(),
            }],
            ..Options::default()
        };
        assert!(HttpEngine::new(&options).is_ok());
    }

    #[test]
    fn test_new_skips_unparseable_cookie_scope() {
        let options = Options {
            cookies: vec![crate::page::Cookie {
                name: "session".to_string(),
                value: "abc123".to_string(),
                scope: "*".to_string(),
            }],
            ..Options::default()
        };
        assert!(HttpEngine::new(&options).is_ok());
    }
}
