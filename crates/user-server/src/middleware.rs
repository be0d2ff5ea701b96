//! Request middleware applied by the application shell.
//!
//! The server installs exactly the middleware it is handed at construction;
//! nothing is enabled implicitly.

use crate::api::ApiError;
use axum::{
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// A layer the application shell can wrap around the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Middleware {
    /// Opens a span per request and logs each response with status and latency.
    RequestLogging,
    /// Turns a panicking handler into a `500` instead of dropping the connection.
    PanicRecovery,
}

impl Middleware {
    /// Request logging and panic recovery.
    pub fn defaults() -> Vec<Middleware> {
        vec![Middleware::RequestLogging, Middleware::PanicRecovery]
    }

    /// Wraps `router` in this layer. Layers applied later sit further out.
    pub(crate) fn apply(self, router: Router) -> Router {
        match self {
            Middleware::RequestLogging => router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
            Middleware::PanicRecovery => router.layer(CatchPanicLayer::custom(panic_response)),
        }
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "request handler panicked");

    ApiError::InternalServerError("internal server error".to_string()).into_response()
}
