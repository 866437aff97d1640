//! Offline cache policy for the app shell.
//!
//! One configurable strategy covers both the development and production
//! builds of the service worker:
//!
//! - **install**: pre-cache the app shell into the current cache generation
//!   and activate immediately
//! - **activate**: delete every other cache generation
//! - **fetch**: network first; good same-origin responses refresh the cache;
//!   on network failure serve the cached copy, then the cached app shell
//!   for page navigations
//!
//! The decisions are pure. Storage sits behind [`CacheStore`] so the browser
//! Cache API (through the WASM bindings) and the in-memory test store behave
//! the same.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which request origins the worker intercepts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginFilter {
    /// Only requests to the worker's own origin.
    #[default]
    SameOrigin,
    /// Any http(s) origin.
    Any,
}

/// Cache strategy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub cache_prefix: String,
    /// Bump to supersede every older cache generation on activation.
    pub version: String,
    /// Assets pre-cached at install.
    pub app_shell: Vec<String>,
    /// Served to navigations when both network and cache miss.
    pub navigation_fallback: String,
    pub origin_filter: OriginFilter,
    /// Requests whose URL contains any of these are left alone.
    pub exclude_patterns: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "crop-picture".to_string(),
            version: "v2".to_string(),
            app_shell: ["./", "./index.html", "./manifest.json", "./favicon.ico", "./logo.svg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            navigation_fallback: "./index.html".to_string(),
            origin_filter: OriginFilter::SameOrigin,
            // Dev-server hot module replacement chunks
            exclude_patterns: vec!["hot-update".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub mode: RequestMode,
}

impl Request {
    pub fn get(url: impl Into<String>, mode: RequestMode) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            mode,
        }
    }
}

/// Fetch API response type; only `Basic` (same-origin) responses are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Basic,
    Cors,
    Opaque,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub kind: ResponseKind,
    pub body: Vec<u8>,
}

impl Response {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            kind: ResponseKind::Basic,
            body: body.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("Network request for {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Pre-cache of {url} got status {status}")]
    BadStatus { url: String, status: u16 },
}

/// Where a handled fetch was answered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker does not intercept this request.
    Passthrough,
    Network(Response),
    Cache(Response),
    /// Navigation fallback to the cached app shell.
    AppShell(Response),
    /// Offline with nothing cached; the fetch fails.
    Unresolved,
}

/// Storage backing the policy, mirroring the browser `CacheStorage` API.
pub trait CacheStore {
    fn cache_names(&self) -> Vec<String>;
    fn delete_cache(&mut self, name: &str) -> bool;
    fn put(&mut self, cache: &str, url: &str, response: Response);
    /// Look a URL up across all caches.
    fn lookup(&self, url: &str) -> Option<Response>;
}

/// The cache strategy bound to the worker's origin.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    config: CacheConfig,
    origin: String,
}

impl CachePolicy {
    /// `origin` is the worker's own origin, e.g. `https://example.com`.
    pub fn new(config: CacheConfig, origin: impl Into<String>) -> Self {
        Self {
            config,
            origin: origin.into(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Name of the current cache generation.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.config.cache_prefix, self.config.version)
    }

    /// Fetch every app-shell asset and store them, all or nothing.
    ///
    /// Returns the number of cached assets.
    pub fn install<S, F>(&self, store: &mut S, mut fetch: F) -> Result<usize, OfflineError>
    where
        S: CacheStore,
        F: FnMut(&str) -> Result<Response, String>,
    {
        let mut fetched = Vec::with_capacity(self.config.app_shell.len());
        for url in &self.config.app_shell {
            let response = fetch(url).map_err(|reason| OfflineError::Network {
                url: url.clone(),
                reason,
            })?;
            if !(200..300).contains(&response.status) {
                return Err(OfflineError::BadStatus {
                    url: url.clone(),
                    status: response.status,
                });
            }
            fetched.push((url, response));
        }

        let name = self.cache_name();
        let count = fetched.len();
        for (url, response) in fetched {
            store.put(&name, url, response);
        }
        log::info!("pre-cached {} app shell assets into {}", count, name);
        Ok(count)
    }

    /// Cache names that belong to older generations.
    pub fn stale_caches(&self, names: &[String]) -> Vec<String> {
        let current = self.cache_name();
        names.iter().filter(|n| **n != current).cloned().collect()
    }

    /// Delete all stale generations; returns what was deleted.
    pub fn activate<S: CacheStore>(&self, store: &mut S) -> Vec<String> {
        let stale = self.stale_caches(&store.cache_names());
        for name in &stale {
            store.delete_cache(name);
        }
        if !stale.is_empty() {
            log::info!("removed stale caches: {:?}", stale);
        }
        stale
    }

    /// Whether the worker intercepts this request at all.
    pub fn should_handle(&self, request: &Request) -> bool {
        if !request.method.eq_ignore_ascii_case("GET") {
            return false;
        }
        let Some(origin) = http_origin(&request.url) else {
            return false;
        };
        if self.config.origin_filter == OriginFilter::SameOrigin
            && !origin.eq_ignore_ascii_case(self.origin.trim_end_matches('/'))
        {
            return false;
        }
        !self
            .config
            .exclude_patterns
            .iter()
            .any(|p| !p.is_empty() && request.url.contains(p.as_str()))
    }

    /// Whether a network response should refresh the cache.
    pub fn should_cache(&self, response: &Response) -> bool {
        response.status == 200 && response.kind == ResponseKind::Basic
    }

    /// Resolve a fetch given the network result.
    pub fn resolve_fetch<S: CacheStore>(
        &self,
        request: &Request,
        network: Result<Response, String>,
        store: &mut S,
    ) -> FetchOutcome {
        if !self.should_handle(request) {
            return FetchOutcome::Passthrough;
        }

        match network {
            Ok(response) => {
                if self.should_cache(&response) {
                    store.put(&self.cache_name(), &request.url, response.clone());
                }
                FetchOutcome::Network(response)
            }
            Err(reason) => {
                log::debug!("offline for {}: {}", request.url, reason);
                if let Some(cached) = store.lookup(&request.url) {
                    return FetchOutcome::Cache(cached);
                }
                if request.mode == RequestMode::Navigate {
                    if let Some(shell) = store.lookup(&self.config.navigation_fallback) {
                        return FetchOutcome::AppShell(shell);
                    }
                }
                FetchOutcome::Unresolved
            }
        }
    }
}

/// `scheme://authority` of an http(s) URL.
fn http_origin(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let scheme_len = url.len() - rest.len();
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    if authority_len == 0 {
        return None;
    }
    Some(&url[..scheme_len + authority_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// `CacheStore` kept in memory.
    #[derive(Debug, Default, Clone)]
    struct MemoryCacheStore {
        caches: BTreeMap<String, BTreeMap<String, Response>>,
    }

    impl CacheStore for MemoryCacheStore {
        fn cache_names(&self) -> Vec<String> {
            self.caches.keys().cloned().collect()
        }

        fn delete_cache(&mut self, name: &str) -> bool {
            self.caches.remove(name).is_some()
        }

        fn put(&mut self, cache: &str, url: &str, response: Response) {
            self.caches
                .entry(cache.to_string())
                .or_default()
                .insert(url.to_string(), response);
        }

        fn lookup(&self, url: &str) -> Option<Response> {
            self.caches.values().find_map(|c| c.get(url).cloned())
        }
    }

    const ORIGIN: &str = "https://crop.example";

    fn policy() -> CachePolicy {
        CachePolicy::new(CacheConfig::default(), ORIGIN)
    }

    fn installed() -> MemoryCacheStore {
        let mut store = MemoryCacheStore::default();
        policy()
            .install(&mut store, |url| Ok(Response::ok(url.as_bytes().to_vec())))
            .unwrap();
        store
    }

    #[test]
    fn test_http_origin() {
        assert_eq!(http_origin("https://a.b/c?d"), Some("https://a.b"));
        assert_eq!(http_origin("http://a.b:8080"), Some("http://a.b:8080"));
        assert_eq!(http_origin("http://a.b?x=1"), Some("http://a.b"));
        assert_eq!(http_origin("chrome-extension://abc/x"), None);
        assert_eq!(http_origin("https:///path"), None);
    }

    #[test]
    fn test_cache_name() {
        assert_eq!(policy().cache_name(), "crop-picture-v2");
    }

    #[test]
    fn test_install_caches_app_shell() {
        let store = installed();
        assert_eq!(store.cache_names(), vec!["crop-picture-v2".to_string()]);
        assert_eq!(store.lookup("./index.html").unwrap().body, b"./index.html".to_vec());
    }

    #[test]
    fn test_install_is_all_or_nothing() {
        let mut store = MemoryCacheStore::default();
        let result = policy().install(&mut store, |url| {
            if url.ends_with("logo.svg") {
                Err("offline".to_string())
            } else {
                Ok(Response::ok(vec![]))
            }
        });
        assert!(matches!(result, Err(OfflineError::Network { .. })));
        assert!(store.cache_names().is_empty());
    }

    #[test]
    fn test_install_rejects_bad_status() {
        let mut store = MemoryCacheStore::default();
        let result = policy().install(&mut store, |_| {
            Ok(Response {
                status: 404,
                kind: ResponseKind::Basic,
                body: vec![],
            })
        });
        assert!(matches!(result, Err(OfflineError::BadStatus { status: 404, .. })));
    }

    #[test]
    fn test_activate_deletes_other_generations() {
        let mut store = installed();
        store.put("crop-picture-v1", "./", Response::ok(vec![]));
        store.put("something-else", "./", Response::ok(vec![]));

        let mut deleted = policy().activate(&mut store);
        deleted.sort();
        assert_eq!(deleted, vec!["crop-picture-v1", "something-else"]);
        assert_eq!(store.cache_names(), vec!["crop-picture-v2".to_string()]);
    }

    #[test]
    fn test_should_handle_filters() {
        let p = policy();
        assert!(p.should_handle(&Request::get("https://crop.example/app.js", RequestMode::Other)));
        assert!(!p.should_handle(&Request::get("https://cdn.example/app.js", RequestMode::Other)));
        assert!(!p.should_handle(&Request::get("data:image/png;base64,AAAA", RequestMode::Other)));
        assert!(!p.should_handle(&Request::get(
            "https://crop.example/main.abc.hot-update.js",
            RequestMode::Other
        )));
        let post = Request {
            method: "POST".to_string(),
            ..Request::get("https://crop.example/api", RequestMode::Other)
        };
        assert!(!p.should_handle(&post));
    }

    #[test]
    fn test_any_origin_filter() {
        let config = CacheConfig {
            origin_filter: OriginFilter::Any,
            exclude_patterns: vec![],
            ..CacheConfig::default()
        };
        let p = CachePolicy::new(config, ORIGIN);
        assert!(p.should_handle(&Request::get("https://cdn.example/x.js", RequestMode::Other)));
        assert!(p.should_handle(&Request::get(
            "https://crop.example/x.hot-update.js",
            RequestMode::Other
        )));
    }

    #[test]
    fn test_network_success_refreshes_cache() {
        let p = policy();
        let mut store = installed();
        let req = Request::get("https://crop.example/app.js", RequestMode::Other);
        let outcome = p.resolve_fetch(&req, Ok(Response::ok(b"new".to_vec())), &mut store);
        assert_eq!(outcome, FetchOutcome::Network(Response::ok(b"new".to_vec())));
        assert_eq!(store.lookup(&req.url).unwrap().body, b"new".to_vec());
    }

    #[test]
    fn test_network_non_basic_not_cached() {
        let p = policy();
        let mut store = MemoryCacheStore::default();
        let req = Request::get("https://crop.example/missing", RequestMode::Other);
        let not_found = Response {
            status: 404,
            kind: ResponseKind::Basic,
            body: vec![],
        };
        let outcome = p.resolve_fetch(&req, Ok(not_found.clone()), &mut store);
        assert_eq!(outcome, FetchOutcome::Network(not_found));
        assert!(store.lookup(&req.url).is_none());
    }

    #[test]
    fn test_offline_serves_cache() {
        let p = policy();
        let mut store = installed();
        let req = Request::get("https://crop.example/app.js", RequestMode::Other);
        p.resolve_fetch(&req, Ok(Response::ok(b"v1".to_vec())), &mut store);
        let outcome = p.resolve_fetch(&req, Err("offline".into()), &mut store);
        assert_eq!(outcome, FetchOutcome::Cache(Response::ok(b"v1".to_vec())));
    }

    #[test]
    fn test_offline_navigation_falls_back_to_shell() {
        let p = policy();
        let mut store = installed();
        let req = Request::get("https://crop.example/some/page", RequestMode::Navigate);
        let outcome = p.resolve_fetch(&req, Err("offline".into()), &mut store);
        assert_eq!(
            outcome,
            FetchOutcome::AppShell(Response::ok(b"./index.html".to_vec()))
        );
    }

    #[test]
    fn test_offline_asset_miss_is_unresolved() {
        let p = policy();
        let mut store = installed();
        let req = Request::get("https://crop.example/chunk.js", RequestMode::Other);
        assert_eq!(
            p.resolve_fetch(&req, Err("offline".into()), &mut store),
            FetchOutcome::Unresolved
        );
    }

    #[test]
    fn test_unhandled_request_passes_through() {
        let p = policy();
        let mut store = MemoryCacheStore::default();
        let req = Request::get("https://cdn.example/font.woff2", RequestMode::Other);
        assert_eq!(
            p.resolve_fetch(&req, Ok(Response::ok(vec![])), &mut store),
            FetchOutcome::Passthrough
        );
        assert!(store.cache_names().is_empty());
    }
}
