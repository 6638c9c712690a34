use std::time::{Duration, Instant};

use axum::{
    body::{self, Body, Bytes},
    extract::{Request, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use quick_cache::sync::Cache;
use tracing::{debug, warn};

use crate::AppState;

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: Duration::from_secs(3600),
            capacity: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedPage {
    content_type: Option<HeaderValue>,
    body: Bytes,
}

impl IntoResponse for CachedPage {
    fn into_response(self) -> Response {
        let mut response = self.body.into_response();
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        response
    }
}

/// Rendered pages keyed by request URI, each valid for `ttl` after insertion.
pub struct PageCache {
    enabled: bool,
    ttl: Duration,
    inner: Cache<String, (Instant, CachedPage)>,
}

impl PageCache {
    pub fn new(config: Config) -> Self {
        Self {
            enabled: config.enabled,
            ttl: config.ttl,
            inner: Cache::new(config.capacity.max(1)),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, key: &str) -> Option<CachedPage> {
        if !self.enabled {
            return None;
        }

        let (inserted, page) = self.inner.get(key)?;
        if inserted.elapsed() < self.ttl {
            return Some(page);
        }

        self.inner.remove(key);
        None
    }

    pub fn insert(&self, key: String, page: CachedPage) {
        if self.enabled {
            self.inner.insert(key, (Instant::now(), page));
        }
    }
}

fn cacheable(response: &Response) -> bool {
    response.status() == StatusCode::OK
        && response
            .headers()
            .get(CACHE_CONTROL)
            .map_or(true, |value| value != "no-store")
}

/// Serves successful GET responses from the page cache, filling it on miss.
pub async fn cache_pages(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.cache.enabled() || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = request.uri().to_string();
    if let Some(page) = state.cache.get(&key) {
        debug!(key = %key, "Serving page from cache");
        return page.into_response();
    }

    let response = next.run(request).await;
    if !cacheable(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Failed to buffer response for caching: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    state.cache.insert(
        key,
        CachedPage {
            content_type: parts.headers.get(CONTENT_TYPE).cloned(),
            body: bytes.clone(),
        },
    );

    Response::from_parts(parts, Body::from(bytes))
}
