//! Service banner

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Banner response
#[derive(Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [&'static str],
}

/// GET /
async fn banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Isothermica Backend API",
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: &["/health", "/contact", "/contacts", "/test-mongodb"],
    })
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(banner))
}
