//! reqwest-backed [`HttpClient`]

use futures::future::BoxFuture;
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tasklist_core::environment::HttpClient;
use tasklist_core::http::{HttpError, HttpMethod, HttpRequest, HttpResponse, JSON_CONTENT_TYPE};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production HTTP client
///
/// Sends JSON bodies, maps non-2xx answers to [`HttpError::Status`] and
/// rejects URLs without a scheme and host with [`HttpError::InvalidUrl`].
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a client with the given per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Transport`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn transport_error(error: &reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Transport {
            message: error.to_string(),
        }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn send(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse, HttpError>> {
        let client = self.client.clone();

        Box::pin(async move {
            let url = Url::parse(&request.url).map_err(|e| HttpError::InvalidUrl {
                url: request.url.clone(),
                message: e.to_string(),
            })?;

            let mut builder = client.request(method(request.method), url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                if request.header_value("content-type").is_none() {
                    builder = builder.header("content-type", JSON_CONTENT_TYPE);
                }
                builder = builder.body(body.to_string());
            }

            let response = builder.send().await.map_err(|e| transport_error(&e))?;
            let status = response.status();
            let body = response.text().await.map_err(|e| transport_error(&e))?;

            tracing::trace!(status = status.as_u16(), bytes = body.len(), "Response received");

            if status.is_success() {
                Ok(HttpResponse::new(status.as_u16(), body))
            } else {
                Err(HttpError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        })
    }
}
