//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.

use std::time::{Duration, Instant};

use probe_application::{HttpClient, HttpClientError, HttpClientFuture};
use probe_domain::{Headers, RequestSpec, ResponseSpec};
use reqwest::{Client, Method, Url};
use tracing::debug;

use crate::config::ClientConfig;

/// HTTP client implementation using reqwest.
///
/// Wraps a `reqwest::Client`, which pools connections, so one instance
/// should be shared by all requests.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with [`ClientConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        Self::from_config(&ClientConfig::default())
    }

    /// Creates a new HTTP client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpClientError> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Creates a new HTTP client with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
            max_redirects: 10,
        }
    }

    fn parse_method(method: &str) -> Result<Method, HttpClientError> {
        Method::from_bytes(method.as_bytes())
            .map_err(|_| HttpClientError::InvalidMethod(method.to_string()))
    }

    fn collect_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        let mut collected = Headers::new();
        for (name, value) in headers {
            collected.append(name.as_str(), value.to_str().unwrap_or("<binary>"));
        }
        collected
    }

    fn timeout_ms(timeout: Duration) -> u64 {
        u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Renders an error followed by every cause in its `source()` chain.
    fn describe_error(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    fn is_refused(error: &reqwest::Error) -> bool {
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            let io_refused = cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::ConnectionRefused);
            if io_refused || cause.to_string().to_lowercase().contains("refused") {
                return true;
            }
            source = cause.source();
        }
        false
    }

    /// Maps reqwest errors to `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error, timeout: Duration) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: Self::timeout_ms(timeout),
            };
        }

        if error.is_builder() {
            return HttpClientError::InvalidRequest(Self::describe_error(error));
        }

        if error.is_connect() {
            if Self::is_refused(error) {
                return HttpClientError::ConnectionRefused {
                    host: error
                        .url()
                        .and_then(Url::host_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(Self::describe_error(error));
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects {
                max: self.max_redirects,
            };
        }

        HttpClientError::Other(Self::describe_error(error))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_client(Client::new()))
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, request: &RequestSpec) -> HttpClientFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let url = Url::parse(&request.url)
                .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.url)))?;
            let method = Self::parse_method(&request.method)?;

            let start = Instant::now();

            let mut builder = self.client.request(method, url).timeout(request.timeout);
            for header in request.headers.iter() {
                builder = builder.header(header.name.as_str(), header.value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| self.map_error(&e, request.timeout))?;

            let status = response.status().as_u16();
            let headers = Self::collect_headers(response.headers());

            let body = response
                .bytes()
                .await
                .map_err(|e| HttpClientError::BodyRead(Self::describe_error(&e)))?
                .to_vec();

            let duration = start.elapsed();
            debug!(request_id = %request.id, status, ?duration, "http call completed");

            Ok(ResponseSpec::new(status, headers, body, duration))
        })
    }
}
