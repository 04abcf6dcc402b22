use crate::error::PaymentError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper for converting `PaymentError` into HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub PaymentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PaymentError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PaymentError::Forbidden(_) | PaymentError::InsufficientFunds => StatusCode::FORBIDDEN,
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PaymentError::CsvError(_)
            | PaymentError::IoError(_)
            | PaymentError::DatabaseError(_)
            | PaymentError::MigrationError(_)
            | PaymentError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(PaymentError::ValidationError(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(PaymentError::ValidationError(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(PaymentError::ValidationError(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_internal() {
            error!(error = %self.0, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
