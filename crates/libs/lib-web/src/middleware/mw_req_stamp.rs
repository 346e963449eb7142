//! # Request Stamping Middleware
//!
//! Gives every HTTP request a UUID request id. The id is stored in request
//! extensions as [`RequestStamp`] (the trace span and the request logger read it)
//! and echoed to the client as `X-Request-ID`.
//!
//! The header is skipped on `101 Switching Protocols`; upgraded sockets log their
//! own session id instead.

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request metadata for tracing and debugging.
#[derive(Clone, Debug)]
pub struct RequestStamp {
    /// Unique request identifier
    pub id: String,
    /// When the request entered the stack
    pub received_at: Instant,
}

impl RequestStamp {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            received_at: Instant::now(),
        }
    }
}

/// Request stamping middleware.
pub async fn stamp_req(mut req: Request, next: Next) -> Response {
    let stamp = RequestStamp::new();
    req.extensions_mut().insert(stamp.clone());

    let mut res = next.run(req).await;

    if res.status() != StatusCode::SWITCHING_PROTOCOLS {
        if let Ok(value) = HeaderValue::from_str(&stamp.id) {
            res.headers_mut().insert(X_REQUEST_ID, value);
        }
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::Extension, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_reaches_handler_and_header() {
        // Arrange
        let app = Router::new()
            .route(
                "/id",
                get(|Extension(stamp): Extension<RequestStamp>| async move { stamp.id }),
            )
            .layer(from_fn(stamp_req));
        let req = Request::builder().uri("/id").body(Body::empty()).unwrap();

        // Act
        let res = app.oneshot(req).await.unwrap();

        // Assert
        let header = res.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&header).is_ok());
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, header.as_bytes());
    }
}
