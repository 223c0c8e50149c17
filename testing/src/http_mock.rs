//! Stubbed [`HttpClient`] with canned responses, recorded requests and gates.
//!
//! Routes are matched on method and URL path, so the same mock serves
//! `http://localhost:3000/todos` and `/todos`. Unmatched requests answer 404.

use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tasklist_core::environment::HttpClient;
use tasklist_core::http::{HttpError, HttpMethod, HttpRequest, HttpResponse};
use tokio::sync::watch;

type Outcome = Result<HttpResponse, HttpError>;
type RouteKey = (HttpMethod, String);

/// Holds requests of a route until opened.
#[derive(Clone, Debug)]
pub struct Gate {
    open: Arc<watch::Sender<bool>>,
}

impl Gate {
    fn new() -> Self {
        let (open, _) = watch::channel(false);
        Self {
            open: Arc::new(open),
        }
    }

    /// Release every held and future request of the route
    pub fn open(&self) {
        self.open.send_replace(true);
    }

    async fn passed(&self) {
        let mut rx = self.open.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[derive(Default)]
struct Route {
    outcomes: VecDeque<Outcome>,
    gate: Option<Gate>,
}

#[derive(Default)]
struct Inner {
    routes: HashMap<RouteKey, Route>,
    requests: Vec<HttpRequest>,
}

/// Mock HTTP client for tests
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tasklist_core::environment::HttpClient;
/// use tasklist_core::http::{HttpMethod, HttpRequest};
/// use tasklist_testing::MockHttpClient;
///
/// # tokio_test::block_on(async {
/// let http = MockHttpClient::new();
/// http.respond_json(HttpMethod::Get, "/todos", 200, json!([]));
///
/// let response = http.send(HttpRequest::get("http://localhost:3000/todos")).await.unwrap();
/// assert_eq!(response.body, "[]");
/// assert_eq!(http.requests().len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct MockHttpClient {
    inner: Arc<Mutex<Inner>>,
    received: Arc<watch::Sender<usize>>,
}

impl Default for MockHttpClient {
    fn default() -> Self {
        let (received, _) = watch::channel(0);
        Self {
            inner: Arc::default(),
            received: Arc::new(received),
        }
    }
}

impl MockHttpClient {
    /// Create a mock without routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for `method path`.
    ///
    /// Outcomes are served in order; the last one keeps being served.
    pub fn respond(&self, method: HttpMethod, path: &str, outcome: Result<HttpResponse, HttpError>) {
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .outcomes
            .push_back(outcome);
    }

    /// Queue a JSON response for `method path`
    pub fn respond_json(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        let outcome = if (200..300).contains(&status) {
            Ok(HttpResponse::new(status, body.to_string()))
        } else {
            Err(HttpError::Status {
                status,
                body: body.to_string(),
            })
        };
        self.respond(method, path, outcome);
    }

    /// Hold requests to `method path` until the returned gate is opened
    #[must_use]
    pub fn gate(&self, method: HttpMethod, path: &str) -> Gate {
        let gate = Gate::new();
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .gate = Some(gate.clone());
        gate
    }

    /// Every request received so far, in arrival order
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Wait until at least `count` requests have been received.
    ///
    /// Returns false on timeout.
    pub async fn wait_for_requests(&self, count: usize, timeout: Duration) -> bool {
        let mut rx = self.received.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|received| *received >= count))
            .await
            .is_ok_and(|result| result.is_ok())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HttpClient for MockHttpClient {
    fn send(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse, HttpError>> {
        let key = (request.method, path_of(&request.url).to_string());

        let (outcome, gate) = {
            let mut inner = self.lock();
            inner.requests.push(request.clone());

            match inner.routes.get_mut(&key) {
                Some(route) => {
                    let outcome = if route.outcomes.len() > 1 {
                        route.outcomes.pop_front()
                    } else {
                        route.outcomes.front().cloned()
                    };
                    (outcome, route.gate.clone())
                }
                None => (None, None),
            }
        };
        self.received.send_modify(|received| *received += 1);

        Box::pin(async move {
            if let Some(gate) = gate {
                gate.passed().await;
            }
            outcome.unwrap_or_else(|| {
                Err(HttpError::Status {
                    status: 404,
                    body: format!("no mock route for {} {}", key.0, key.1),
                })
            })
        })
    }
}

/// Path part of an absolute or relative URL, without query
fn path_of(url: &str) -> &str {
    let without_origin = match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            rest.find('/').map_or("/", |slash| &rest[slash..])
        }
        None => url,
    };
    without_origin
        .split(['?', '#'])
        .next()
        .unwrap_or(without_origin)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use serde_json::json;

    #[test]
    fn path_of_strips_origin_and_query() {
        assert_eq!(path_of("http://localhost:3000/todos/1?x=1"), "/todos/1");
        assert_eq!(path_of("http://localhost:3000"), "/");
        assert_eq!(path_of("/todos"), "/todos");
    }

    #[tokio::test]
    async fn unmatched_route_is_404() {
        let http = MockHttpClient::new();

        let error = http
            .send(HttpRequest::new(HttpMethod::Delete, "/todos/1"))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(404));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn outcomes_are_served_in_order_and_last_repeats() {
        let http = MockHttpClient::new();
        http.respond_json(HttpMethod::Get, "/todos", 500, json!("boom"));
        http.respond_json(HttpMethod::Get, "/todos", 200, json!([]));

        let first = http.send(HttpRequest::get("/todos")).await;
        let second = http.send(HttpRequest::get("/todos")).await;
        let third = http.send(HttpRequest::get("/todos")).await;

        assert_eq!(first.unwrap_err().status(), Some(500));
        assert_eq!(second.unwrap().body, "[]");
        assert_eq!(third.unwrap().body, "[]");
    }

    #[tokio::test]
    async fn gate_holds_until_opened() {
        let http = MockHttpClient::new();
        http.respond_json(HttpMethod::Get, "/todos", 200, json!([]));
        let gate = http.gate(HttpMethod::Get, "/todos");

        let pending = tokio::spawn(http.send(HttpRequest::get("/todos")));
        assert!(http.wait_for_requests(1, Duration::from_secs(1)).await);
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.open();
        assert!(pending.await.unwrap().is_ok());
    }
}
