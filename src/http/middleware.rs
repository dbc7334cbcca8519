//! Request logging and panic handling.
//!
//! # Responsibilities
//! - Log `Request started` / `Request completed` records for every request
//! - Level the completion record ERROR for 4xx/5xx, INFO otherwise
//! - Report the handling time in `X-Process-Time`
//! - Turn handler panics into a logged 500

use std::any::Any;
use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_http::catch_panic::ResponseForPanic;

use crate::callsite;
use crate::http::request::request_id;
use crate::logging::{Context, Emitter, Level};
use crate::observability::metrics;

tokio::task_local! {
    /// Request fields of the request being handled on this task.
    static REQUEST_CONTEXT: Context;
}

/// Response header carrying the handling time in seconds.
pub const X_PROCESS_TIME: &str = "x-process-time";

/// Full request URL as the client addressed it.
fn request_url(req: &Request) -> String {
    let uri = req.uri();
    if uri.scheme().is_some() {
        return uri.to_string();
    }
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    match req.headers().get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, path),
        None => path.to_string(),
    }
}

/// Axum middleware logging each request through the emitter.
pub async fn request_logging(State(emitter): State<Emitter>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let client_host = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let context = Context::new()
        .with("request_id", request_id(&req))
        .with("method", &method)
        .with("url", request_url(&req))
        .with("client_host", client_host)
        .with("user_agent", user_agent);

    let _ = emitter.log_at(
        callsite!(),
        Level::Info,
        format!("Request started: {} {}", method, path),
        context.clone(),
    );

    let mut response = REQUEST_CONTEXT.scope(context.clone(), next.run(req)).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    let level = if status >= 400 { Level::Error } else { Level::Info };

    let _ = emitter.log_at(
        callsite!(),
        level,
        format!(
            "Request completed: {} {} - {} ({:.4}s)",
            method, path, status, elapsed
        ),
        context
            .with("status_code", status)
            .with("process_time", format!("{:.4}s", elapsed)),
    );

    metrics::record_request(&method, status, start);

    if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
        response.headers_mut().insert(X_PROCESS_TIME, value);
    }
    response
}

/// Answers handler panics with a 500 and an ERROR record.
///
/// Runs inside [`request_logging`], so the record carries the request's
/// `request_id`, `method` and `url`.
#[derive(Clone)]
pub struct PanicResponder {
    emitter: Emitter,
}

impl PanicResponder {
    pub fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }
}

fn panic_message(err: &(dyn Any + Send)) -> &str {
    if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        let detail = panic_message(err.as_ref());
        let context = REQUEST_CONTEXT
            .try_with(Context::clone)
            .unwrap_or_default()
            .with("exception", detail);
        let _ = self.emitter.log_at(
            callsite!(),
            Level::Error,
            format!("Unhandled error: {}", detail),
            context,
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "detail": "Internal server error",
                "message": "An unexpected error occurred",
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::EmitterConfig;
    use axum::{body::to_bytes, middleware, routing::get, Router};
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_handler_panic_logged_and_answered_500() {
        let (emitter, sink) = Emitter::in_memory(EmitterConfig::default());
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(PanicResponder::new(emitter.clone())))
            .layer(middleware::from_fn_with_state(emitter, request_logging));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/boom")
                    .header(header::HOST, "api.local")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Internal server error");

        let values = sink.values();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0]["message"], "Request started: GET /boom");

        assert_eq!(values[1]["level"], "ERROR");
        assert_eq!(values[1]["message"], "Unhandled error: kaboom");
        assert_eq!(values[1]["exception"], "kaboom");
        assert_eq!(values[1]["method"], "GET");
        assert_eq!(values[1]["url"], "http://api.local/boom");

        assert_eq!(values[2]["level"], "ERROR");
        assert_eq!(values[2]["status_code"], 500);
        assert!(values[2]["message"]
            .as_str()
            .unwrap()
            .starts_with("Request completed: GET /boom - 500"));
    }

    #[test]
    fn test_panic_outside_request_has_no_request_fields() {
        let (emitter, sink) = Emitter::in_memory(EmitterConfig::default());
        let response = PanicResponder::new(emitter).response_for_panic(Box::new("bang"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let value = &sink.values()[0];
        assert_eq!(value["exception"], "bang");
        assert!(value.get("method").is_none());
    }

    #[test]
    fn test_request_url_from_host() {
        let req = axum::http::Request::builder()
            .uri("/regions?page=2")
            .header(header::HOST, "api.local:8000")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_url(&req), "http://api.local:8000/regions?page=2");
    }

    #[test]
    fn test_request_url_absolute() {
        let req = axum::http::Request::builder()
            .uri("http://example.com/health")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_url(&req), "http://example.com/health");
    }

    #[test]
    fn test_panic_message() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("boom"));
        let borrowed: Box<dyn Any + Send> = Box::new("bang");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(owned.as_ref()), "boom");
        assert_eq!(panic_message(borrowed.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
