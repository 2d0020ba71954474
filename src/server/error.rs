use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json
};
use log::error;
use serde_json::json;

use cashbook::LedgerError;

pub(crate) enum ServerError {
    Invalid(String),
    NotFound(String),
    InternalError(anyhow::Error)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Invalid(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Resource not found: {}", msg)),
            Self::InternalError(err) => {
                error!("request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {:#}", err))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(invalid) => Self::Invalid(invalid.to_string()),
            LedgerError::Index { .. } => Self::NotFound(err.to_string()),
            LedgerError::Io { .. } | LedgerError::Corrupt { .. } => Self::InternalError(err.into())
        }
    }
}
