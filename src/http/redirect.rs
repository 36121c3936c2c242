//! Store-backed redirect service.
//!
//! # Responsibilities
//! - Read every known path from the store on each request
//! - Answer `302 Found` when the request path has a stored destination
//! - Hand everything else to the wrapped fallback service
//!
//! # Design Decisions
//! - Store reads run on the blocking pool; redb I/O is synchronous
//! - Store failures are logged and the request falls through; clients never see them
//! - No caching: a reload of the store is visible on the next request
//! - Paths are matched after percent-decoding; undecodable paths fall through

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use percent_encoding::{percent_decode_str, utf8_percent_encode, CONTROLS};
use tower::{Layer, Service};

use crate::routing::{resolve, RouteTable};
use crate::store::{RouteStore, StoreError};

/// Layer that wraps a fallback service in [`Redirect`].
#[derive(Clone)]
pub struct RedirectLayer {
    store: RouteStore,
    table: Arc<RouteTable>,
}

impl RedirectLayer {
    pub fn new(store: RouteStore, table: Arc<RouteTable>) -> Self {
        Self { store, table }
    }
}

impl<S> Layer<S> for RedirectLayer {
    type Service = Redirect<S>;

    fn layer(&self, fallback: S) -> Self::Service {
        Redirect::new(self.store.clone(), Arc::clone(&self.table), fallback)
    }
}

/// Redirects known paths, delegates the rest to `fallback`.
#[derive(Clone)]
pub struct Redirect<S> {
    store: RouteStore,
    table: Arc<RouteTable>,
    fallback: S,
}

impl<S> Redirect<S> {
    pub fn new(store: RouteStore, table: Arc<RouteTable>, fallback: S) -> Self {
        Self {
            store,
            table,
            fallback,
        }
    }
}

impl<S> Service<Request> for Redirect<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.fallback.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // Keep the instance that was polled ready; leave a fresh clone behind.
        let clone = self.fallback.clone();
        let mut fallback = std::mem::replace(&mut self.fallback, clone);
        let store = self.store.clone();
        let table = Arc::clone(&self.table);

        Box::pin(async move {
            let Some(path) = decoded_path(&request) else {
                tracing::debug!(path = %request.uri().path(), "Path is not valid UTF-8, using fallback");
                metrics::counter!("redirect_requests_total", "outcome" => "fallback").increment(1);
                return fallback.call(request).await;
            };

            match read_destinations(store, table).await {
                Ok(values) => {
                    if let Some(destination) = resolve(&values, &path) {
                        tracing::debug!(path = %path, destination = %destination, "Redirecting");
                        metrics::counter!("redirect_requests_total", "outcome" => "redirect")
                            .increment(1);
                        return Ok(found(destination, request.method()));
                    }
                    metrics::counter!("redirect_requests_total", "outcome" => "fallback")
                        .increment(1);
                }
                Err(e) => {
                    tracing::error!(path = %path, error = %e, "Route lookup failed, using fallback");
                    metrics::counter!("redirect_requests_total", "outcome" => "store_error")
                        .increment(1);
                }
            }

            fallback.call(request).await
        })
    }
}

/// Percent-decoded request path, or `None` when it does not decode to UTF-8.
fn decoded_path(request: &Request) -> Option<String> {
    percent_decode_str(request.uri().path())
        .decode_utf8()
        .ok()
        .map(|path| path.into_owned())
}

async fn read_destinations(
    store: RouteStore,
    table: Arc<RouteTable>,
) -> Result<std::collections::HashMap<String, String>, StoreError> {
    tokio::task::spawn_blocking(move || store.lookup(table.known_paths())).await?
}

/// Build a `302 Found` response pointing at `destination`.
///
/// Non-ASCII bytes are percent-encoded in `Location`; only GET gets a body.
fn found(destination: &str, method: &Method) -> Response {
    let encoded = utf8_percent_encode(destination, CONTROLS).to_string();
    let location = match HeaderValue::from_str(&encoded) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!(destination = %destination, "Destination is not a valid header value");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if *method != Method::GET {
        return (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
    }

    let body = format!("<a href=\"{}\">Found</a>.\n\n", html_escape(destination));
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            ),
        ],
        body,
    )
        .into_response()
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
