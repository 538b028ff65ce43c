//! Generic HTTP GET source.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::{ConfigError, Source, SourceError};

/// One request target: URL plus query pairs.
///
/// Query values may carry credentials; they are never logged or put into errors.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// URL without query string.
    pub url: String,
    /// Query parameters appended to `url`.
    pub query: Vec<(String, String)>,
}

impl Endpoint {
    /// Endpoint with no query parameters.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.query.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("query_keys", &keys)
            .finish()
    }
}

type EndpointFn = Box<dyn Fn() -> Endpoint + Send + Sync>;

/// Source that GETs a freshly chosen endpoint on every fetch.
pub struct HttpSource {
    service: String,
    client: reqwest::Client,
    timeout: Duration,
    endpoint: EndpointFn,
}

impl HttpSource {
    /// Build a source for `service`, calling `endpoint` before every request.
    ///
    /// Idle connections are not pooled: each worker drives its own runtime,
    /// and a pooled connection would be bound to the runtime that opened it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the HTTP client cannot be built.
    pub fn new<F>(service: impl Into<String>, timeout: Duration, endpoint: F) -> Result<Self, ConfigError>
    where
        F: Fn() -> Endpoint + Send + Sync + 'static,
    {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("http client: {e}")))?;

        Ok(Self {
            service: service.into(),
            client,
            timeout,
            endpoint: Box::new(endpoint),
        })
    }

    /// Next endpoint this source would request.
    #[must_use]
    pub fn next_endpoint(&self) -> Endpoint {
        (self.endpoint)()
    }

    fn classify(&self, err: &reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else if let Some(status) = err.status() {
            SourceError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.path().to_owned()).unwrap_or_default(),
            }
        } else {
            // Strip the URL: its query string may hold an API key
            let mut message = err.to_string();
            if let Some(url) = err.url() {
                message = message.replace(url.as_str(), url.path());
            }
            SourceError::Transport(message)
        }
    }
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("service", &self.service)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Source for HttpSource {
    fn service_name(&self) -> &str {
        &self.service
    }

    async fn fetch(&self) -> Result<Option<String>, SourceError> {
        let endpoint = self.next_endpoint();
        info!(service = %self.service, url = %endpoint.url, "Fetching data");

        let response = self
            .client
            .get(&endpoint.url)
            .query(&endpoint.query)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: endpoint.url,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(&e))?;
        debug!(service = %self.service, bytes = body.len(), "Response received");

        if body.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(body))
        }
    }
}
