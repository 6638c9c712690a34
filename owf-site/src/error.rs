use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use owf_schedule::ScheduleError;

use crate::photo::{PhotoError, MAX_SIZE};
use crate::render;

#[derive(Debug, Error)]
pub enum SiteError {
    /// Rendered as the 404 page in `lang`.
    #[error("page not found")]
    NotFound { lang: String },

    #[error("failed to render template: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to lay out schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("thumbnail size {size} is larger than {max}", max = MAX_SIZE)]
    PhotoSize { size: u32 },

    #[error(transparent)]
    Photo(#[from] PhotoError),
}

impl SiteError {
    pub fn not_found(lang: &str) -> Self {
        SiteError::NotFound {
            lang: lang.to_string(),
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        match self {
            SiteError::NotFound { lang } => render::not_found(&lang),
            err @ SiteError::PhotoSize { .. } => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            err => {
                error!("{err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
