//! Custom Axum extractors

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, Extensions, HeaderMap, StatusCode};
use axum::{Form, Json};
use serde_json::{Map, Value};

use super::error::ApiError;
use super::server::AppState;
use crate::models::ValidationError;

/// Header carrying the operator key for protected reads
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Resolve the caller's address.
///
/// With `trust_proxy` one proxy hop is trusted: the last `X-Forwarded-For`
/// entry wins. Otherwise, or without that header, the socket peer address.
pub fn client_ip(
    headers: &HeaderMap,
    extensions: &Extensions,
    trust_proxy: bool,
) -> Option<String> {
    let forwarded = trust_proxy
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|list| list.rsplit(',').map(str::trim).find(|ip| !ip.is_empty()));

    if let Some(ip) = forwarded {
        return Some(ip.to_owned());
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Caller's network address, if it can be determined
pub struct ClientIp(pub Option<String>);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(
            &parts.headers,
            &parts.extensions,
            state.config.trust_proxy,
        )))
    }
}

/// Proof that the caller may read stored contacts.
///
/// Outside production every caller passes. In production the `x-admin-key`
/// header must match the configured key; with no key configured nobody passes.
pub struct AdminAccess;

impl FromRequestParts<Arc<AppState>> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !state.config.environment.is_production() {
            return Ok(Self);
        }

        let provided = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        match (provided, state.config.admin_key.as_deref()) {
            (Some(provided), Some(expected)) if keys_match(provided, expected) => Ok(Self),
            _ => {
                tracing::warn!("rejected contacts listing without valid admin key");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Compare without short-circuiting on the first differing byte
fn keys_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Submission body as a key/value map, from JSON or a urlencoded form
pub struct SubmissionBody(pub Map<String, Value>);

impl<S> FromRequest<S> for SubmissionBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| body_rejection(rejection.status(), rejection.body_text()))?;

            let map = pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return Ok(Self(map));
        }

        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| body_rejection(rejection.status(), rejection.body_text()))?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ValidationError::NotAnObject.into()),
        }
    }
}

fn body_rejection(status: StatusCode, reason: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadBody { reason }
    }
}
