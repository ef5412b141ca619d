//! Request middleware: rate limiting, security headers, panic recovery

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::error::ApiError;
use super::extractors::client_ip;
use super::server::AppState;
use crate::config::RateLimitConfig;

/// Most clients tracked at once; the oldest window is evicted past this
const MAX_TRACKED_CLIENTS: usize = 10_000;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per client address
pub struct RateLimiter {
    config: RateLimitConfig,
    capacity: usize,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_capacity(config, MAX_TRACKED_CLIENTS)
    }

    pub fn with_capacity(config: RateLimitConfig, capacity: usize) -> Self {
        Self {
            config,
            capacity: capacity.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Number of clients currently holding a window
    pub async fn tracked_clients(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Count one request for `client`.
    ///
    /// Returns the time until the window resets when the ceiling is exceeded.
    pub async fn check(&self, client: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let window_len = self.config.window;
        let mut windows = self.windows.lock().await;

        if !windows.contains_key(client) && windows.len() >= self.capacity {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);

            if windows.len() >= self.capacity {
                let oldest = windows
                    .iter()
                    .min_by_key(|(_, w)| w.started)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    windows.remove(&key);
                }
            }
        }

        let window = windows.entry(client.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.config.max_requests {
            return Err(window_len.saturating_sub(now.duration_since(window.started)));
        }

        window.count += 1;
        Ok(())
    }
}

/// Reject callers over the configured request ceiling
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_ip(
        request.headers(),
        request.extensions(),
        state.config.trust_proxy,
    )
    .unwrap_or_else(|| "unknown".to_string());

    if let Err(retry_after) = state.rate_limiter.check(&client).await {
        tracing::warn!(client = %client, "rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after });
    }

    Ok(next.run(request).await)
}

/// Add conservative security headers unless a handler set them
pub async fn security_headers(mut response: Response) -> Response {
    const HEADERS: &[(&str, &str)] = &[
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "SAMEORIGIN"),
        ("referrer-policy", "no-referrer"),
        ("x-dns-prefetch-control", "off"),
        ("x-download-options", "noopen"),
        ("x-permitted-cross-domain-policies", "none"),
        (
            "strict-transport-security",
            "max-age=15552000; includeSubDomains",
        ),
    ];

    let headers = response.headers_mut();
    for &(name, value) in HEADERS {
        headers
            .entry(HeaderName::from_static(name))
            .or_insert(HeaderValue::from_static(value));
    }
    headers.remove(header::SERVER);
    headers.remove("x-powered-by");
    response
}

/// Fallback for unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Turn a handler panic into a JSON 500.
///
/// The panic message is included only when `expose_details` is set.
pub fn panic_response(err: Box<dyn Any + Send + 'static>, expose_details: bool) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::Internal {
        details: expose_details.then(|| message.clone()),
        message,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn allows_up_to_ceiling() {
        let limiter = limiter(3);
        for _ in 0..3 {
            assert!(limiter.check("198.51.100.1").await.is_ok());
        }
        assert!(limiter.check("198.51.100.1").await.is_err());

        // Other clients have their own window
        assert!(limiter.check("198.51.100.2").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets() {
        let limiter = limiter(1);
        assert!(limiter.check("a").await.is_ok());

        let retry_after = limiter.check("a").await.unwrap_err();
        assert!(retry_after <= Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("a").await.is_ok());
    }

    #[tokio::test]
    async fn tracked_clients_are_capped() {
        let limiter = RateLimiter::with_capacity(
            RateLimitConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
            },
            3,
        );

        for n in 0..25 {
            assert!(limiter.check(&format!("client-{n}")).await.is_ok());
            assert!(limiter.tracked_clients().await <= 3);
        }

        // Newest clients keep their windows
        assert!(limiter.check("client-24").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_windows_make_room_first() {
        let limiter = RateLimiter::with_capacity(
            RateLimitConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
            },
            2,
        );
        limiter.check("a").await.unwrap();
        limiter.check("b").await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.check("c").await.unwrap();
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn security_headers_are_added() {
        let response = security_headers(StatusCode::OK.into_response()).await;
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
    }

    #[test]
    fn panic_details_only_when_exposed() {
        let response = panic_response(Box::new("boom"), false);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(String::from("boom")), true);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
