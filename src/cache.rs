// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Content cache and loader for icon markup.
//!
//! [`IconCache`] is an explicitly constructed handle; clones share the same
//! state, so the host creates one per process (or per test) and passes it to
//! every element. It keeps three maps behind a single mutex:
//!
//! * content: URL → SVG markup, empty when the load failed;
//! * in-flight: URL → shared future of the one fetch running for that URL;
//! * failed: URLs that exhausted their retries and are no longer fetched.
//!
//! Entries loaded with sanitizing disabled are remembered as raw; a later
//! caller that asks for sanitized markup gets it sanitized on delivery.
//!
//! A fetch runs on its own tokio task, so it completes even when every caller
//! that asked for it has gone away. The task writes the content entry and
//! removes the in-flight entry under the same lock, so a caller observes
//! either a pending flight or a settled entry, never neither.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
    data_url::{decode_svg_data_url, is_inline_svg},
    fetch::{FetchError, Fetcher},
    retry::{RetryConfig, retry_with_backoff},
    sanitize::{Sanitizer, SvgSanitizer},
};

type Flight = Shared<BoxFuture<'static, (),>,>;

enum Lookup
{
    Ready
    {
        content: String,
        raw:     bool,
    },
    Wait(Flight,),
}

/// Per-load options.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct LoadOptions
{
    /// Run fetched markup through the sanitizer (default: `true`).
    pub sanitize: bool,
}

impl Default for LoadOptions
{
    fn default() -> Self
    {
        Self {
            sanitize: true,
        }
    }
}

#[derive(Default,)]
struct CacheState
{
    content:   HashMap<String, String,>,
    in_flight: HashMap<String, Flight,>,
    failed:    HashSet<String,>,
    /// URLs whose content was stored without sanitizing.
    raw:       HashSet<String,>,
}

/// Shared, coalescing cache of icon markup keyed by URL.
#[derive(Clone,)]
pub struct IconCache
{
    state:     Arc<Mutex<CacheState,>,>,
    fetcher:   Arc<dyn Fetcher,>,
    sanitizer: Arc<dyn Sanitizer,>,
    retry:     RetryConfig,
}

impl std::fmt::Debug for IconCache
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        let state = lock(&self.state,);
        f.debug_struct("IconCache",)
            .field("entries", &state.content.len(),)
            .field("in_flight", &state.in_flight.len(),)
            .field("failed", &state.failed.len(),)
            .field("retry", &self.retry,)
            .finish()
    }
}

impl IconCache
{
    /// Creates an empty cache fetching through `fetcher`, sanitizing with
    /// [`SvgSanitizer`] and retrying with [`RetryConfig::default`].
    pub fn new(fetcher: Arc<dyn Fetcher,>,) -> Self
    {
        Self {
            state: Arc::new(Mutex::new(CacheState::default(),),),
            fetcher,
            sanitizer: Arc::new(SvgSanitizer,),
            retry: RetryConfig::default(),
        }
    }

    /// Replaces the sanitizer collaborator.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer,>,) -> Self
    {
        self.sanitizer = sanitizer;
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig,) -> Self
    {
        self.retry = retry;
        self
    }

    /// Cached markup for `url`, if the URL has settled.
    pub fn get(&self, url: &str,) -> Option<String,>
    {
        lock(&self.state,).content.get(url,).cloned()
    }

    /// Returns `true` when `url` has a settled entry.
    pub fn contains(&self, url: &str,) -> bool
    {
        lock(&self.state,).content.contains_key(url,)
    }

    /// Returns `true` when `url` exhausted its retries.
    pub fn is_failed(&self, url: &str,) -> bool
    {
        lock(&self.state,).failed.contains(url,)
    }

    /// Number of fetches currently running.
    pub fn in_flight(&self,) -> usize
    {
        lock(&self.state,).in_flight.len()
    }

    /// Number of settled entries.
    pub fn len(&self,) -> usize
    {
        lock(&self.state,).content.len()
    }

    /// Returns `true` when no entry has settled yet.
    pub fn is_empty(&self,) -> bool
    {
        self.len() == 0
    }

    /// Forgets failed URLs so that the next [`load`](Self::load) fetches them
    /// again.
    pub fn clear_failed(&self,)
    {
        let mut state = lock(&self.state,);
        let failed: Vec<String,> = state.failed.drain().collect();
        for url in failed {
            state.content.remove(&url,);
            state.raw.remove(&url,);
        }
    }

    /// Drops every entry and the failed set. Fetches already running still
    /// settle into the cache when they finish.
    pub fn reset(&self,)
    {
        let mut state = lock(&self.state,);
        state.content.clear();
        state.failed.clear();
        state.raw.clear();
    }

    /// Loads `url` with default options and returns its markup.
    pub async fn load(&self, url: &str,) -> String
    {
        self.load_with(url, LoadOptions::default(),).await
    }

    /// Loads `url` and returns its markup, empty when the load failed.
    ///
    /// Concurrent calls for the same URL share one fetch. Settled URLs and
    /// URLs in the failed set return immediately without network access.
    /// Inline SVG data URLs are decoded synchronously. With
    /// [`LoadOptions::sanitize`] set, the returned markup is sanitized even
    /// when the shared entry was stored raw by another caller.
    pub async fn load_with(&self, url: &str, options: LoadOptions,) -> String
    {
        let lookup = {
            let mut state = lock(&self.state,);

            if let Some(content,) = state.content.get(url,) {
                debug!("Icon cache hit for {}", url);
                Lookup::Ready {
                    content: content.clone(), raw: state.raw.contains(url,),
                }
            } else if state.failed.contains(url,) {
                debug!("Skipping {} after earlier failures", url);
                state.content.insert(url.to_owned(), String::new(),);
                return String::new();
            } else if let Some(flight,) = state.in_flight.get(url,) {
                debug!("Joining in-flight request for {}", url);
                Lookup::Wait(flight.clone(),)
            } else if is_inline_svg(url,) {
                let content = self.decode_inline(url, options,);
                if !options.sanitize && !content.is_empty() {
                    state.raw.insert(url.to_owned(),);
                }
                state.content.insert(url.to_owned(), content.clone(),);
                return content;
            } else {
                let flight = self.spawn_fetch(url.to_owned(), options,);
                state.in_flight.insert(url.to_owned(), flight.clone(),);
                Lookup::Wait(flight,)
            }
        };

        let (content, raw,) = match lookup {
            Lookup::Ready {
                content,
                raw,
            } => (content, raw,),
            Lookup::Wait(flight,) => {
                flight.await;
                let state = lock(&self.state,);
                (state.content.get(url,).cloned().unwrap_or_default(), state.raw.contains(url,),)
            }
        };

        if raw && options.sanitize {
            debug!("Sanitizing raw cache entry for {}", url);
            return self.sanitizer.sanitize(&content,).unwrap_or_default();
        }
        content
    }

    fn decode_inline(&self, url: &str, options: LoadOptions,) -> String
    {
        let Some(markup,) = decode_svg_data_url(url,) else {
            warn!("Discarding undecodable inline SVG");
            return String::new();
        };

        if options.sanitize { self.sanitizer.sanitize(&markup,).unwrap_or_default() } else { markup }
    }

    fn spawn_fetch(&self, url: String, options: LoadOptions,) -> Flight
    {
        let state = Arc::clone(&self.state,);
        let fetcher = Arc::clone(&self.fetcher,);
        let sanitizer = Arc::clone(&self.sanitizer,);
        let retry = self.retry.clone();
        let task_url = url.clone();

        let handle = tokio::spawn(async move {
            let outcome = fetch_with_retry(fetcher, &retry, &task_url,).await;
            let raw = !options.sanitize;
            let (content, failed,) = match outcome {
                Ok(body,) if body.is_empty() || raw => (body, false,),
                Ok(body,) => match sanitizer.sanitize(&body,) {
                    Some(clean,) => (clean, false,),
                    None => {
                        warn!("Sanitizer rejected markup from {}", task_url);
                        (String::new(), false,)
                    }
                },
                Err(error,) => {
                    warn!("Giving up on {}: {}", task_url, error);
                    (String::new(), true,)
                }
            };

            let raw = raw && !content.is_empty();
            settle(&state, &task_url, content, failed, raw,);
        },);

        let state = Arc::clone(&self.state,);
        async move {
            if let Err(error,) = handle.await {
                warn!("Icon fetch task for {} aborted: {}", url, error);
                settle(&state, &url, String::new(), false, false,);
            }
        }
        .boxed()
        .shared()
    }
}

async fn fetch_with_retry(
    fetcher: Arc<dyn Fetcher,>,
    retry: &RetryConfig,
    url: &str,
) -> Result<String, FetchError,>
{
    let attempt_timeout = retry.attempt_timeout();
    let operation = format!("fetch {url}");

    retry_with_backoff(retry, &operation, || {
        let fetcher = Arc::clone(&fetcher,);
        let url = url.to_owned();
        async move {
            let response = timeout(attempt_timeout, fetcher.fetch(&url,),)
                .await
                .map_err(|_| FetchError::Timeout,)??;
            if response.is_ok() {
                Ok(response.body,)
            } else {
                Err(FetchError::Status {
                    status: response.status,
                },)
            }
        }
    },)
    .await
}

fn settle(state: &Mutex<CacheState,>, url: &str, content: String, failed: bool, raw: bool,)
{
    let mut state = lock(state,);
    if failed {
        state.failed.insert(url.to_owned(),);
    }
    if raw {
        state.raw.insert(url.to_owned(),);
    } else {
        state.raw.remove(url,);
    }
    state.content.insert(url.to_owned(), content,);
    state.in_flight.remove(url,);
}

fn lock(state: &Mutex<CacheState,>,) -> MutexGuard<'_, CacheState,>
{
    state.lock().unwrap_or_else(PoisonError::into_inner,)
}

#[cfg(test)]
mod tests
{
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use futures::future::join_all;

    use super::*;
    use crate::fetch::FetchResponse;

    const ARCHIVE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M1 1h14v4H1z"/></svg>"#;

    /// Fetcher double that counts calls and replays a fixed outcome.
    struct ScriptedFetcher
    {
        calls:   AtomicU32,
        delay:   Duration,
        outcome: Box<dyn Fn(u32,) -> Result<FetchResponse, FetchError,> + Send + Sync,>,
    }

    impl ScriptedFetcher
    {
        fn new<F,>(delay: Duration, outcome: F,) -> Arc<Self,>
        where
            F: Fn(u32,) -> Result<FetchResponse, FetchError,> + Send + Sync + 'static,
        {
            Arc::new(Self {
                calls: AtomicU32::new(0,), delay, outcome: Box::new(outcome,),
            },)
        }

        fn calls(&self,) -> u32
        {
            self.calls.load(Ordering::SeqCst,)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher
    {
        async fn fetch(&self, _url: &str,) -> Result<FetchResponse, FetchError,>
        {
            let call = self.calls.fetch_add(1, Ordering::SeqCst,) + 1;
            tokio::time::sleep(self.delay,).await;
            (self.outcome)(call,)
        }
    }

    fn cache_with(fetcher: Arc<ScriptedFetcher,>,) -> IconCache
    {
        IconCache::new(fetcher,)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_loads_share_one_fetch()
    {
        let fetcher = ScriptedFetcher::new(Duration::from_millis(50,), |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);

        let loads = (0..8).map(|_| cache.load("/svg/archive.svg",),);
        let results = join_all(loads,).await;

        assert_eq!(fetcher.calls(), 1);
        assert!(results.iter().all(|content| content == ARCHIVE));
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_loads_hit_the_cache()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);

        cache.load("/svg/archive.svg",).await;
        cache.load("/svg/archive.svg",).await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.get("/svg/archive.svg",).as_deref(), Some(ARCHIVE));
    }

    #[tokio::test(start_paused = true)]
    async fn different_urls_fetch_independently()
    {
        let fetcher = ScriptedFetcher::new(Duration::from_millis(10,), |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);

        let (a, b,) = tokio::join!(cache.load("/svg/a.svg"), cache.load("/svg/b.svg"));

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_failures_stop_after_four_attempts()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::status(503,),),);
        let cache = cache_with(fetcher.clone(),);

        let content = cache.load("/svg/flaky.svg",).await;

        assert_eq!(content, "");
        assert_eq!(fetcher.calls(), 4);
        assert!(cache.is_failed("/svg/flaky.svg"));
        assert_eq!(cache.get("/svg/flaky.svg",).as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_attempted_once()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::status(404,),),);
        let cache = cache_with(fetcher.clone(),);

        assert_eq!(cache.load("/svg/missing.svg",).await, "");
        assert_eq!(fetcher.calls(), 1);
        assert!(cache.is_failed("/svg/missing.svg"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_recovers_on_retry()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |call| {
            if call < 3 {
                Err(FetchError::Transport {
                    message: "connection reset".into(),
                },)
            } else {
                Ok(FetchResponse::ok(ARCHIVE,),)
            }
        },);
        let cache = cache_with(fetcher.clone(),);

        assert_eq!(cache.load("/svg/archive.svg",).await, ARCHIVE);
        assert_eq!(fetcher.calls(), 3);
        assert!(!cache.is_failed("/svg/archive.svg"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out_and_are_retried()
    {
        let fetcher = ScriptedFetcher::new(Duration::from_secs(60,), |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);

        assert_eq!(cache.load("/svg/slow.svg",).await, "");
        assert_eq!(fetcher.calls(), 4);
        assert!(cache.is_failed("/svg/slow.svg"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_urls_short_circuit_until_cleared()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |call| {
            if call == 1 { Ok(FetchResponse::status(404,),) } else { Ok(FetchResponse::ok(ARCHIVE,),) }
        },);
        let cache = cache_with(fetcher.clone(),);

        cache.load("/svg/late.svg",).await;
        cache.load("/svg/late.svg",).await;
        assert_eq!(fetcher.calls(), 1);

        cache.clear_failed();
        assert!(!cache.contains("/svg/late.svg"));
        assert_eq!(cache.load("/svg/late.svg",).await, ARCHIVE);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unsafe_markup_is_stored_empty()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| {
            Ok(FetchResponse::ok(r#"<svg xmlns="http://www.w3.org/2000/svg"><script>x()</script></svg>"#,),)
        },);
        let cache = cache_with(fetcher.clone(),);

        assert_eq!(cache.load("/svg/evil.svg",).await, "");
        assert!(cache.contains("/svg/evil.svg"));
        assert!(!cache.is_failed("/svg/evil.svg"));
    }

    #[tokio::test(start_paused = true)]
    async fn sanitize_can_be_disabled()
    {
        let raw = "<?xml version=\"1.0\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        let fetcher = ScriptedFetcher::new(Duration::ZERO, move |_| Ok(FetchResponse::ok(raw,),),);
        let cache = cache_with(fetcher.clone(),);

        let content = cache
            .load_with(
                "/svg/raw.svg",
                LoadOptions {
                    sanitize: false,
                },
            )
            .await;
        assert_eq!(content, raw);
    }

    #[tokio::test(start_paused = true)]
    async fn inline_svg_never_touches_the_network()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);
        let url = format!("data:image/svg+xml;utf8,{ARCHIVE}");

        assert_eq!(cache.load(&url,).await, ARCHIVE);
        assert_eq!(cache.load("data:image/svg+xml;base64,!!!",).await, "");
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn data_url_without_encoding_is_decoded_inline()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::status(404,),),);
        let cache = cache_with(fetcher.clone(),);
        let url = "data:image/svg+xml,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%2F%3E";

        assert_eq!(cache.load(url,).await, r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#);
        assert_eq!(fetcher.calls(), 0);
        assert!(!cache.is_failed(url));
    }

    #[tokio::test(start_paused = true)]
    async fn inline_unsafe_markup_is_stored_empty()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);
        let url = "data:image/svg+xml;utf8,<svg xmlns=\"http://www.w3.org/2000/svg\"><script>x()</script></svg>";

        assert_eq!(cache.load(url,).await, "");
        assert_eq!(cache.get(url,).as_deref(), Some(""));
        assert!(!cache.is_failed(url));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn coalesced_failure_shares_one_retry_sequence()
    {
        let fetcher = ScriptedFetcher::new(Duration::from_millis(20,), |_| Ok(FetchResponse::status(503,),),);
        let cache = cache_with(fetcher.clone(),);

        let loads = (0..6).map(|_| cache.load("/svg/down.svg",),);
        let results = join_all(loads,).await;

        assert_eq!(fetcher.calls(), 4);
        assert!(results.iter().all(String::is_empty));
        assert!(cache.is_failed("/svg/down.svg"));
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn raw_entries_are_sanitized_for_later_callers()
    {
        let evil = r#"<svg xmlns="http://www.w3.org/2000/svg"><script>x()</script></svg>"#;
        let fetcher = ScriptedFetcher::new(Duration::ZERO, move |_| Ok(FetchResponse::ok(evil,),),);
        let cache = cache_with(fetcher.clone(),);
        let raw = LoadOptions {
            sanitize: false,
        };

        assert_eq!(cache.load_with("/svg/evil.svg", raw,).await, evil);
        assert_eq!(cache.load("/svg/evil.svg",).await, "");
        assert_eq!(cache.load_with("/svg/evil.svg", raw,).await, evil);
        assert_eq!(fetcher.calls(), 1);

        let inline = format!("data:image/svg+xml;utf8,{evil}");
        assert_eq!(cache.load_with(&inline, raw,).await, evil);
        assert_eq!(cache.load(&inline,).await, "");
    }

    #[tokio::test(start_paused = true)]
    async fn joined_flight_is_sanitized_per_caller()
    {
        let evil = r#"<svg xmlns="http://www.w3.org/2000/svg"><path onclick="x()"/></svg>"#;
        let fetcher = ScriptedFetcher::new(Duration::from_millis(30,), move |_| Ok(FetchResponse::ok(evil,),),);
        let cache = cache_with(fetcher.clone(),);

        let (raw, clean,) = tokio::join!(
            cache.load_with(
                "/svg/evil.svg",
                LoadOptions {
                    sanitize: false,
                },
            ),
            cache.load("/svg/evil.svg"),
        );

        assert_eq!(raw, evil);
        assert_eq!(clean, "");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_load_still_settles()
    {
        let fetcher = ScriptedFetcher::new(Duration::from_millis(100,), |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);

        let abandoned = tokio::time::timeout(Duration::from_millis(10,), cache.load("/svg/archive.svg",),).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(200,),).await;
        assert_eq!(cache.get("/svg/archive.svg",).as_deref(), Some(ARCHIVE));
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_isolates_state()
    {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, |_| Ok(FetchResponse::ok(ARCHIVE,),),);
        let cache = cache_with(fetcher.clone(),);

        cache.load("/svg/archive.svg",).await;
        cache.reset();
        assert!(cache.is_empty());

        cache.load("/svg/archive.svg",).await;
        assert_eq!(fetcher.calls(), 2);
    }
}
