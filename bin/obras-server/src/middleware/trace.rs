//! Per-request tracing.
//!
//! Every request runs inside an `http_request` span carrying a trace id,
//! taken from the `x-trace-id` header when it holds a UUID and generated
//! otherwise. The id is echoed on the response. JSON bodies whose size hint
//! proves them small are logged in both directions. Every other body,
//! including large or unsized JSON, streams through without being buffered.

use std::time::Instant;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

const MAX_LOGGED_BODY: usize = 1024;

pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");

        let (parts, body) = req.into_parts();
        let body = log_json_body("request", &parts.headers, body).await;
        let mut req = Request::from_parts(parts, body);
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(req).await;

        let (mut parts, body) = response.into_parts();
        let body = log_json_body("response", &parts.headers, body).await;
        if let Some(value) = trace_header {
            parts.headers.insert(X_TRACE_ID, value);
        }
        let response = Response::from_parts(parts, body);

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response finished"
        );

        response
    }
    .instrument(span)
    .await
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

/// Log a JSON body if it is small; pass every other body through untouched.
async fn log_json_body(direction: &str, headers: &HeaderMap, body: Body) -> Body {
    if !is_json(headers) {
        return body;
    }

    match body.size_hint().upper() {
        Some(size) if size <= MAX_LOGGED_BODY as u64 => {}
        size => {
            info!(size = ?size, "{direction} body: [skipped]");
            return body;
        }
    }

    let bytes: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "{direction} body could not be read");
            return Body::empty();
        }
    };

    if let Ok(text) = std::str::from_utf8(&bytes) {
        info!("{direction} body: {text}");
    }

    Body::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router, middleware,
        routing::{get, post},
    };
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { axum::Json(serde_json::json!({ "pong": true })) }))
            .route(
                "/echo-len",
                post(|body: Bytes| async move { body.len().to_string() }),
            )
            .layer(middleware::from_fn(trace_middleware))
    }

    fn json_post(body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/echo-len")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    async fn text(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn large_json_body_is_not_logged() {
        let payload = format!("{{\"titulo\":\"{}\"}}", "x".repeat(4 * MAX_LOGGED_BODY));
        let len = payload.len();
        let response = app().oneshot(json_post(Body::from(payload))).await.unwrap();

        assert_eq!(text(response).await, len.to_string());
        assert!(logs_contain("request body: [skipped]"));
        assert!(!logs_contain("xxxxxxxx"));
    }

    #[tokio::test]
    #[traced_test]
    async fn unsized_json_body_streams_through() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = (0..64)
            .map(|_| Ok(Bytes::from_static(b"          ")))
            .collect();
        let body = Body::from_stream(futures::stream::iter(chunks));
        let response = app().oneshot(json_post(body)).await.unwrap();

        assert_eq!(text(response).await, "640");
        assert!(logs_contain("request body: [skipped]"));
    }

    #[tokio::test]
    #[traced_test]
    async fn small_json_request_body_is_logged() {
        let response = app()
            .oneshot(json_post(Body::from(r#"{"titulo":"A"}"#)))
            .await
            .unwrap();
        assert_eq!(text(response).await, "14");
        assert!(logs_contain(r#"request body: {"titulo":"A"}"#));
    }

    #[tokio::test]
    #[traced_test]
    async fn generates_trace_id_and_logs_json_body() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let trace_id = response.headers()[X_TRACE_ID].to_str().unwrap().to_owned();
        assert!(Uuid::parse_str(&trace_id).is_ok());

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"pong":true}"#);
        assert!(logs_contain("response body: {\"pong\":true}"));
        assert!(logs_contain("response finished"));
    }

    #[tokio::test]
    async fn reuses_incoming_trace_id() {
        let incoming = Uuid::new_v4().to_string();
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(X_TRACE_ID, &incoming)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_TRACE_ID], incoming.as_str());
    }
}
