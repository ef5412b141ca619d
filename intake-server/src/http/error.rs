//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Every body carries a human-readable `error` string.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::StoreError;
use crate::models::{ValidationError, ValidationErrors};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Submission failed validation (400)
    Validation(ValidationErrors),

    /// Body could not be parsed (400)
    BadBody { reason: String },

    /// Body exceeds the size limit (413)
    PayloadTooLarge,

    /// Missing or wrong admin key (401)
    Unauthorized,

    /// No healthy store handle (503)
    StoreUnavailable,

    /// Saving a submission failed (500, logged, never echoes the cause)
    SubmissionFailed(StoreError),

    /// Any other store operation failed (500, logged)
    Store {
        source: StoreError,
        details: Option<String>,
    },

    /// Too many requests from one client (429)
    RateLimited { retry_after: Duration },

    /// No route matched (404)
    NotFound,

    /// Internal error (500)
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    /// Store failure; `expose` controls whether the cause is echoed back
    pub fn store(source: StoreError, expose: bool) -> Self {
        let details = expose.then(|| source.to_string());
        Self::Store { source, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Dados inválidos",
                    "details": errors.messages()
                }),
            ),
            Self::BadBody { reason } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Corpo da requisição inválido",
                    "details": [reason]
                }),
            ),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "Corpo da requisição excede o limite de 10kb" }),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Não autorizado" }),
            ),
            Self::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "Database não conectado",
                    "success": false
                }),
            ),
            Self::SubmissionFailed(source) => {
                // Log the actual error, return generic message
                tracing::error!(error = %source, "failed to save contact");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Erro ao processar sua mensagem. Tente novamente mais tarde.",
                        "success": false
                    }),
                )
            }
            Self::Store { source, details } => {
                tracing::error!(error = %source, "store operation failed");
                let mut body = json!({
                    "error": "Erro ao acessar o banco de dados",
                    "success": false
                });
                if let Some(details) = details {
                    body["details"] = json!(details);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            Self::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "Muitas requisições deste IP, tente novamente mais tarde." }),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Endpoint não encontrado" }),
            ),
            Self::Internal { message, details } => {
                tracing::error!("Internal error: {}", message);
                let mut body = json!({ "error": "Erro interno do servidor" });
                if let Some(details) = details {
                    body["details"] = json!(details);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.into())
    }
}
