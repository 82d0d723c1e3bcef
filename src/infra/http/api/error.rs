use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::error::{AppError, ErrorReport};
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

/// Error envelope shared by every folio surface.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub message: String,
    pub code: String,
}

pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_REFERENCE: &str = "INVALID_REFERENCE";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const BAD_GATEWAY: &str = "BAD_GATEWAY";
    pub const GATEWAY_TIMEOUT: &str = "GATEWAY_TIMEOUT";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let report = ErrorReport::from_message(source, status, format!("{code}: {message}"));
        Self {
            status,
            code,
            message,
            report,
        }
    }

    pub fn validation(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::BAD_REQUEST,
            codes::VALIDATION_ERROR,
            message,
        )
    }

    pub fn not_found(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn with_report(mut self, report: ErrorReport) -> Self {
        self.report = report;
        self
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        const SOURCE: &str = "infra::http::api::app_error";

        let (status, code, message) = match &err {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, codes::NOT_FOUND, err.to_string()),
            AppError::InvalidReference { .. } => (
                StatusCode::BAD_REQUEST,
                codes::INVALID_REFERENCE,
                err.to_string(),
            ),
            AppError::Domain(DomainError::Validation { message }) | AppError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                codes::VALIDATION_ERROR,
                message.clone(),
            ),
            AppError::Repo(RepoError::Timeout | RepoError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                codes::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            ),
            AppError::Repo(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
                "Unexpected error occurred".to_string(),
            ),
        };

        let report = ErrorReport::from_error(SOURCE, status, &err);
        ApiError::new(SOURCE, status, code, message).with_report(report)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("infra::http::api::json", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation("infra::http::api::path", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation("infra::http::api::query", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            message: self.message,
            code: self.code.to_string(),
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        self.report.attach(&mut response);
        response
    }
}
