use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// Logs every request with its status and how long it took to serve
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "handled request"
    );

    response
}
