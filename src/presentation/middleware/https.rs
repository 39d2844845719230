//! HTTPS Enforcement Middleware
//!
//! Behind the hosting platform's router TLS is terminated upstream, so the
//! original scheme arrives in `X-Forwarded-Proto`. When enforcement is on,
//! plain HTTP requests are redirected to the same URL over HTTPS and HTTPS
//! responses carry `Strict-Transport-Security`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// HSTS max-age in seconds (1 year)
const HSTS_MAX_AGE: u64 = 31_536_000;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Redirect plain HTTP to HTTPS when `force_https` is set.
pub async fn enforce_https(
    State(force_https): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    if !force_https {
        return next.run(request).await;
    }

    if is_https(&request) {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={}", HSTS_MAX_AGE)) {
            response
                .headers_mut()
                .insert(header::STRICT_TRANSPORT_SECURITY, value);
        }
        return response;
    }

    let Some(host) = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
    else {
        return (StatusCode::BAD_REQUEST, "Missing Host header").into_response();
    };

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{}{}", host, path);

    tracing::debug!(%location, "Redirecting to HTTPS");
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

fn is_https(request: &Request) -> bool {
    if request.uri().scheme_str() == Some("https") {
        return true;
    }
    request
        .headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}
