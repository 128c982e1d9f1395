//! Mapping of store errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chartas_canvas::CanvasError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Canvas(CanvasError::IncorrectImageId(_)) => StatusCode::NOT_FOUND,
            Self::Canvas(CanvasError::IncorrectImageRegion(_) | CanvasError::Codec(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Canvas(CanvasError::Storage(_)) | Self::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
