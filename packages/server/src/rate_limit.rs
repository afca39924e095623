//! Per-client request limiting.
//!
//! Each client address gets a fixed window: the first request opens it,
//! and once `max` requests have landed inside it further requests are
//! refused with `429` until the window expires.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use jharia_watch_server_models::{ApiError, ApiResponse};

/// Default number of requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 200;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Tracked clients beyond which expired windows are dropped.
const PRUNE_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client address.
pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `key` at `now`. Returns `false` when the
    /// client has used up its allowance for the current window.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if clients.len() >= PRUNE_THRESHOLD {
            clients.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        }

        let window = clients.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max {
            return false;
        }

        window.count += 1;
        true
    }
}

/// Middleware refusing clients that exceed the [`RateLimiter`] registered
/// as app data. Requests pass through untouched when none is registered.
///
/// # Errors
///
/// Propagates errors from the wrapped service.
pub async fn limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(limiter) = req.app_data::<web::Data<RateLimiter>>() {
        let client = req
            .peer_addr()
            .map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string());

        if !limiter.check(&client, Instant::now()) {
            log::warn!("Rate limit exceeded for {client}");
            let response = HttpResponse::TooManyRequests()
                .json(ApiResponse::failure(ApiError::rate_limited()));
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    Ok(next.call(req).await?.map_into_left_body())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, middleware::from_fn, test};

    use super::*;

    #[::core::prelude::v1::test]
    fn allowance_resets_after_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check("10.0.0.1", start));
        assert!(limiter.check("10.0.0.1", start + Duration::from_secs(1)));
        assert!(!limiter.check("10.0.0.1", start + Duration::from_secs(59)));

        assert!(limiter.check("10.0.0.1", start + Duration::from_secs(60)));
        assert!(limiter.check("10.0.0.1", start + Duration::from_secs(61)));
        assert!(!limiter.check("10.0.0.1", start + Duration::from_secs(62)));
    }

    #[::core::prelude::v1::test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check("10.0.0.1", now));
        assert!(!limiter.check("10.0.0.1", now));
        assert!(limiter.check("10.0.0.2", now));
    }

    #[actix_web::test]
    async fn requests_past_the_allowance_get_429() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(RateLimiter::new(
                    DEFAULT_MAX_REQUESTS,
                    DEFAULT_WINDOW,
                )))
                .wrap(from_fn(limit))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        for _ in 0..DEFAULT_MAX_REQUESTS {
            let resp =
                test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
        assert_eq!(body["error"]["message"]["en"], "Too many requests");
        assert_eq!(body["error"]["message"]["hi"], "बहुत सारे अनुरोध");
    }

    #[actix_web::test]
    async fn missing_limiter_passes_through() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(limit))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
