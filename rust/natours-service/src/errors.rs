//! The single error type every handler returns, and the boundary that turns
//! it into a JSON response.
//!
//! [`AppError::into_response`] always renders the production-safe body and
//! attaches an [`ErrorReport`] to the response. The [`error_boundary`]
//! middleware logs every report and, in development, re-renders the body with
//! the full error detail.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use natours_core::StoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::Environment;
use crate::state::AppState;

pub const TOUR_NOT_FOUND: &str = "Tour not found with that ID";
const MASKED_MESSAGE: &str = "Something went very wrong!";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn tour_not_found() -> Self {
        AppError::NotFound(TOUR_NOT_FOUND.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Expected failures whose message is safe to show to the caller.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                AppError::BadRequest(format!("Invalid input data. {}", messages.join(". ")))
            }
            StoreError::Duplicate { value, .. } => AppError::BadRequest(format!("Duplicate field value: \"{value}\". Please use another value!")),
            StoreError::Cast { field, value } => AppError::BadRequest(format!("Invalid {field}: {value}.")),
            StoreError::Query(msg) => AppError::BadRequest(format!("Invalid query: {msg}.")),
            StoreError::Body(e) => AppError::BadRequest(format!("Invalid input data. {e}")),
            other @ (StoreError::Json(_) | StoreError::Sqlite(_)) => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// What the boundary needs to log and re-render an error response.
#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub detail: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn status_label(status: StatusCode) -> &'static str {
    if status.is_client_error() { "fail" } else { "error" }
}

fn render(status: StatusCode, message: &str, detail: Option<&str>) -> Response {
    let body = ErrorBody { status: status_label(status), message, error: detail };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let shown = if self.is_operational() { message.as_str() } else { MASKED_MESSAGE };
        let mut res = render(status, shown, None);
        res.extensions_mut().insert(ErrorReport { status, message, detail: format!("{self:?}") });
        res
    }
}

pub async fn error_boundary(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let res = next.run(req).await;
    let Some(report) = res.extensions().get::<ErrorReport>().cloned() else { return res };

    if report.status.is_server_error() {
        error!(%method, %uri, status = report.status.as_u16(), error = %report.detail, "request failed");
    } else {
        warn!(%method, %uri, status = report.status.as_u16(), message = %report.message, "request rejected");
    }

    match state.environment {
        Environment::Development => render(report.status, &report.message, Some(&report.detail)),
        Environment::Production => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use natours_core::FieldError;

    #[test]
    fn store_errors_map_to_operational_messages() {
        let err: AppError = StoreError::Validation(vec![
            FieldError::new("name", "A tour must have a name"),
            FieldError::new("price", "A tour must have a price"),
        ])
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid input data. A tour must have a name. A tour must have a price");

        let err: AppError = StoreError::Duplicate { field: "name", value: "The Forest Hiker".into() }.into();
        assert_eq!(err.to_string(), "Duplicate field value: \"The Forest Hiker\". Please use another value!");

        let err: AppError = StoreError::Cast { field: "price".into(), value: "abc".into() }.into();
        assert_eq!(err.to_string(), "Invalid price: abc.");
    }

    #[test]
    fn storage_failures_are_internal() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AppError = StoreError::Json(json_err).into();
        assert!(!err.is_operational());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn production_body_masks_internal_errors() {
        let res = AppError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = res.extensions().get::<ErrorReport>().expect("report attached");
        assert_eq!(report.message, "disk on fire");
    }
}
