//! # Response Mapping Middleware
//!
//! Last stop before a response leaves the router: server errors are logged with
//! their request id so a client reporting `X-Request-ID` can be traced.

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::error;

use super::mw_req_stamp::RequestStamp;

/// Response mapping middleware.
pub async fn map_res(req: Request, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let path = req.uri().path().to_string();

    let res = next.run(req).await;

    if res.status().is_server_error() {
        error!(
            request_id = %request_id,
            path = %path,
            status = res.status().as_u16(),
            "[RESPONSE] Server error: {} {}",
            res.status(),
            path
        );
    }

    res
}
