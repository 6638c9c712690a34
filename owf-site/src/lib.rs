//! The localized Open World Forum site: schedule views over a conference
//! loaded once at startup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tracing::debug;

pub mod cache;
pub mod cli;
pub mod error;
pub mod i18n;
pub mod photo;
pub mod render;
pub mod store;
pub mod views;

pub use cache::PageCache;
pub use error::SiteError;
pub use store::{Conference, LoadError, Site};

#[derive(Clone)]
pub struct AppState {
    pub conference: Arc<Conference>,
    pub cache: Arc<PageCache>,
}

impl AppState {
    pub fn new(conference: Conference, cache: cache::Config) -> Self {
        Self {
            conference: Arc::new(conference),
            cache: Arc::new(PageCache::new(cache)),
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    debug!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = millis(started.elapsed()),
        "Handled request"
    );
    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(views::root))
        .route("/:lang/", get(views::home))
        .route("/:lang/program/", get(views::program_view))
        .route("/:lang/tracks/", get(views::tracks))
        .route("/:lang/tracks/:id", get(views::track))
        .route("/:lang/tracks/:id/ics", get(views::track_ics))
        .route("/:lang/talks/", get(views::talks))
        .route("/:lang/rooms/", get(views::rooms))
        .route("/:lang/rooms/:id", get(views::room))
        .route("/:lang/speakers/", get(views::speakers))
        .route("/:lang/speakers/:id/", get(views::speaker))
        .route("/:lang/speakers/:id/photo", get(views::speaker_photo))
        .route("/:lang/schedule/", get(views::schedule_index))
        .route("/:lang/schedule/:day/", get(views::schedule))
        .route("/:lang/schedule.ics", get(views::schedule_ics))
        .fallback(views::fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cache::cache_pages,
        ))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}
