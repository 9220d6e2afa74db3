use crate::store::StoreError;
use ntex::http::StatusCode;
use ntex::web::{HttpResponse, WebResponseError};

pub const LEVEL_LOCKED_MESSAGE: &str = "Level is currently locked";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Level is currently locked")]
    LevelLocked,
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LevelLocked => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub(crate) fn body(&self) -> serde_json::Value {
        match self {
            AppError::Store(e) => serde_json::json!({
                "error": "Store unavailable",
                "retryable": e.is_retryable(),
            }),
            AppError::Validation(errors) => serde_json::json!({
                "success": false,
                "errors": errors,
            }),
            AppError::LevelLocked => serde_json::json!({
                "success": false,
                "error": LEVEL_LOCKED_MESSAGE,
            }),
            AppError::BadRequest(msg) => serde_json::json!({ "error": msg }),
        }
    }
}

impl WebResponseError for AppError {
    fn error_response(&self, _: &ntex::web::HttpRequest) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        HttpResponse::build(status).json(&self.body())
    }
}
