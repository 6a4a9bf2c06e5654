use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Stamp the wildcard CORS origin header on every response, success or
/// failure. Preflight-specific headers are handled by the OPTIONS route.
pub async fn cors_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;

    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        header::HeaderValue::from_static("*"),
    );

    response
}
