//! Cache policy bindings for the service worker.
//!
//! The Cache API is asynchronous, so the worker script does the awaiting and
//! the policy makes every decision synchronously on what the worker found.
//! Install, activate and fetch all run through [`CachePolicy`].
//!
//! # Example (service worker)
//!
//! ```typescript
//! const policy = new JsCachePolicy(undefined, self.location.origin);
//!
//! self.addEventListener('install', (event) => event.waitUntil((async () => {
//!   const urls = policy.precache_urls();
//!   const responses = await Promise.all(urls.map((u) => fetch(u)));
//!   policy.check_precache(new Uint16Array(responses.map((r) => r.status)));
//!   const cache = await caches.open(policy.cache_name);
//!   await Promise.all(urls.map((u, i) => cache.put(u, responses[i])));
//!   await self.skipWaiting();
//! })()));
//!
//! self.addEventListener('activate', (event) => event.waitUntil((async () => {
//!   for (const name of policy.activate(await caches.keys())) await caches.delete(name);
//!   await self.clients.claim();
//! })()));
//!
//! self.addEventListener('fetch', (event) => {
//!   const req = event.request;
//!   if (!policy.should_handle(req.url, req.method, req.mode === 'navigate')) return;
//!   event.respondWith(fetch(req).then(async (res) => {
//!     const d = policy.on_network_response(req.url, req.method, req.mode === 'navigate', res.status, res.type === 'basic');
//!     if (d.store_in) (await caches.open(d.store_in)).put(req, res.clone());
//!     return res;
//!   }, async () => {
//!     const hits = [];
//!     if (await caches.match(req)) hits.push(req.url);
//!     if (await caches.match(policy.navigation_fallback)) hits.push(policy.navigation_fallback);
//!     const d = policy.on_network_error(req.url, req.method, req.mode === 'navigate', hits);
//!     return d.cached_url ? caches.match(d.cached_url) : Response.error();
//!   }));
//! });
//! ```

use wasm_bindgen::prelude::*;
use widecrop_core::offline::{
    CacheConfig, CachePolicy, CacheStore, FetchOutcome, OfflineError, Request, RequestMode,
    Response, ResponseKind,
};

use crate::types::config_from_js;

/// `CacheStore` over what the worker already read from the Cache API.
///
/// Lookups answer from the URLs the worker found; writes are recorded for
/// the worker to carry out.
#[derive(Debug, Default)]
struct CacheSnapshot {
    names: Vec<String>,
    hits: Vec<String>,
    puts: Vec<String>,
}

impl CacheStore for CacheSnapshot {
    fn cache_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn delete_cache(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    fn put(&mut self, cache: &str, _url: &str, _response: Response) {
        self.puts.push(cache.to_string());
    }

    fn lookup(&self, url: &str) -> Option<Response> {
        self.hits
            .iter()
            .any(|hit| hit == url)
            .then(|| Response::ok(Vec::new()))
    }
}

/// What the worker should do with one intercepted fetch.
#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsFetchDecision {
    source: &'static str,
    cached_url: Option<String>,
    store_in: Option<String>,
}

#[wasm_bindgen]
impl JsFetchDecision {
    /// One of `passthrough`, `network`, `cache`, `app-shell` or `unresolved`
    #[wasm_bindgen(getter)]
    pub fn source(&self) -> String {
        self.source.to_string()
    }

    /// Cached URL to answer with (`cache` and `app-shell` only)
    #[wasm_bindgen(getter)]
    pub fn cached_url(&self) -> Option<String> {
        self.cached_url.clone()
    }

    /// Cache to store the network response in, if it should be stored
    #[wasm_bindgen(getter)]
    pub fn store_in(&self) -> Option<String> {
        self.store_in.clone()
    }
}

#[wasm_bindgen]
pub struct JsCachePolicy {
    inner: CachePolicy,
}

#[wasm_bindgen]
impl JsCachePolicy {
    /// `config` is an optional partial `CacheConfig`; `origin` is `self.location.origin`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, origin: String) -> Result<JsCachePolicy, JsValue> {
        let config: CacheConfig = config_from_js(config)?;
        Ok(Self::with_config(config, origin))
    }

    /// Name of the current cache generation
    #[wasm_bindgen(getter)]
    pub fn cache_name(&self) -> String {
        self.inner.cache_name()
    }

    /// App-shell URLs to fetch at install
    pub fn precache_urls(&self) -> Vec<String> {
        self.inner.config().app_shell.clone()
    }

    /// Validate the app-shell fetch statuses, in `precache_urls` order.
    ///
    /// Throws unless every asset came back 2xx; nothing should be stored then.
    pub fn check_precache(&self, statuses: Vec<u16>) -> Result<u32, JsValue> {
        self.precache(statuses)
            .map(|count| count as u32)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// From `caches.keys()`, the names to delete at activation
    pub fn activate(&self, names: Vec<String>) -> Vec<String> {
        let mut store = CacheSnapshot {
            names,
            ..CacheSnapshot::default()
        };
        self.inner.activate(&mut store)
    }

    pub fn should_handle(&self, url: String, method: String, is_navigation: bool) -> bool {
        self.inner
            .should_handle(&request(url, method, is_navigation))
    }

    /// The network answered (`response.status`, `response.type === 'basic'`).
    pub fn on_network_response(
        &self,
        url: String,
        method: String,
        is_navigation: bool,
        status: u16,
        is_basic: bool,
    ) -> JsFetchDecision {
        let kind = if is_basic {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };
        let response = Response {
            status,
            kind,
            body: Vec::new(),
        };
        self.decide(request(url, method, is_navigation), Ok(response), Vec::new())
    }

    /// The network failed. `cached_urls` lists which of the request URL and
    /// `navigation_fallback` the worker found with `caches.match`.
    pub fn on_network_error(
        &self,
        url: String,
        method: String,
        is_navigation: bool,
        cached_urls: Vec<String>,
    ) -> JsFetchDecision {
        self.decide(
            request(url, method, is_navigation),
            Err("network error".to_string()),
            cached_urls,
        )
    }

    /// Cached URL served to navigations when offline
    #[wasm_bindgen(getter)]
    pub fn navigation_fallback(&self) -> String {
        self.inner.config().navigation_fallback.clone()
    }
}

impl JsCachePolicy {
    pub(crate) fn with_config(config: CacheConfig, origin: String) -> Self {
        Self {
            inner: CachePolicy::new(config, origin),
        }
    }

    fn precache(&self, statuses: Vec<u16>) -> Result<usize, OfflineError> {
        let mut statuses = statuses.into_iter();
        let mut store = CacheSnapshot::default();
        self.inner.install(&mut store, |_| {
            statuses
                .next()
                .map(|status| Response {
                    status,
                    kind: ResponseKind::Basic,
                    body: Vec::new(),
                })
                .ok_or_else(|| "not fetched".to_string())
        })
    }

    fn decide(
        &self,
        request: Request,
        network: Result<Response, String>,
        hits: Vec<String>,
    ) -> JsFetchDecision {
        let mut store = CacheSnapshot {
            hits,
            ..CacheSnapshot::default()
        };
        let outcome = self.inner.resolve_fetch(&request, network, &mut store);
        let (source, cached_url) = match outcome {
            FetchOutcome::Passthrough => ("passthrough", None),
            FetchOutcome::Network(_) => ("network", None),
            FetchOutcome::Cache(_) => ("cache", Some(request.url)),
            FetchOutcome::AppShell(_) => (
                "app-shell",
                Some(self.inner.config().navigation_fallback.clone()),
            ),
            FetchOutcome::Unresolved => ("unresolved", None),
        };
        JsFetchDecision {
            source,
            cached_url,
            store_in: store.puts.pop(),
        }
    }
}

fn request(url: String, method: String, is_navigation: bool) -> Request {
    let mode = if is_navigation {
        RequestMode::Navigate
    } else {
        RequestMode::Other
    };
    Request { url, method, mode }
}
