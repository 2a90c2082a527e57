use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::identify::IdentifyError;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Identify(#[from] IdentifyError),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Identify(err) => match err {
                IdentifyError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
                IdentifyError::EmptyImage => StatusCode::BAD_REQUEST,
                IdentifyError::Request(_)
                | IdentifyError::Upstream { .. }
                | IdentifyError::EmptyResponse
                | IdentifyError::Malformed(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
