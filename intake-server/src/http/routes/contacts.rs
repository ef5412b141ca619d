//! Contact endpoints
//!
//! POST /contact: sanitize → validate → store → confirm
//! GET /contacts: admin check → list newest first

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{AdminAccess, ClientIp, SubmissionBody};
use crate::http::server::AppState;
use crate::models::{sanitize_fields, Contact, ContactSubmission};

/// Submission accepted response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

impl SubmitResponse {
    fn saved() -> Self {
        Self {
            message: "Mensagem enviada com sucesso! Retornaremos em breve.",
            success: true,
            note: None,
        }
    }

    fn accepted_offline() -> Self {
        Self {
            message: "Mensagem recebida! Entraremos em contato em breve.",
            success: true,
            note: Some("Sistema temporariamente offline, mas sua mensagem foi registrada."),
        }
    }
}

/// POST /contact - validate and store a submission
async fn submit_contact(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    SubmissionBody(body): SubmissionBody,
) -> Result<Json<SubmitResponse>, ApiError> {
    let body = sanitize_fields(body);
    let submission = ContactSubmission::validate(&body)?;

    let store = match state.connections.get().await {
        Ok(store) => store,
        Err(e) if state.config.accept_when_offline => {
            tracing::warn!(
                email = %submission.email,
                error = %e,
                "store unavailable, submission acknowledged without saving"
            );
            return Ok(Json(SubmitResponse::accepted_offline()));
        }
        Err(_) => return Err(ApiError::StoreUnavailable),
    };

    let email = submission.email.clone();
    match store.insert(submission.with_ip(ip)).await {
        Ok(id) => {
            tracing::info!(%id, email = %email, "contact saved");
            Ok(Json(SubmitResponse::saved()))
        }
        Err(e) => {
            if e.is_connection_error() {
                state.connections.reset(&store).await;
            }
            Err(ApiError::SubmissionFailed(e))
        }
    }
}

/// GET /contacts - every stored contact, newest first
async fn list_contacts(
    _admin: AdminAccess,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let store = state
        .connections
        .get()
        .await
        .map_err(|_| ApiError::StoreUnavailable)?;

    match store.list_all().await {
        Ok(contacts) => Ok(Json(contacts)),
        Err(e) => {
            if e.is_connection_error() {
                state.connections.reset(&store).await;
            }
            Err(ApiError::store(
                e,
                state.config.environment.exposes_error_details(),
            ))
        }
    }
}

/// Contact routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/contacts", get(list_contacts))
}
