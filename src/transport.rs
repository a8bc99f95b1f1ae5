//! Plumbing shared by the async and blocking clients: the closable transport
//! slot, URL resolution and request preparation.

use crate::config::Credential;
use crate::{ClientConfig, Error, RequestBody, RequestSpec, Result, RetryPolicy};
use http::HeaderMap;
use std::sync::RwLock;
use url::Url;

/// State shared by every clone of a client.
pub(crate) struct Shared<C> {
    pub(crate) config: ClientConfig,
    pub(crate) base_url: Url,
    pub(crate) policy: RetryPolicy,
    transport: RwLock<Option<C>>,
}

impl<C: Clone> Shared<C> {
    pub(crate) fn new(config: ClientConfig, transport: C) -> Result<Self> {
        let base_url = Url::parse(config.base_url()).map_err(|e| {
            Error::ConfigValidation(format!("Invalid URL provided: {}: {}", config.base_url(), e))
        })?;

        Ok(Self {
            policy: RetryPolicy::from_config(&config),
            config,
            base_url,
            transport: RwLock::new(Some(transport)),
        })
    }

    /// Returns a handle to the connection pool, or [`Error::Closed`].
    pub(crate) fn transport(&self) -> Result<C> {
        let slot = self.transport.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().ok_or(Error::Closed)
    }

    /// Drops the pool. Returns `false` if it was already closed.
    pub(crate) fn close(&self) -> bool {
        let mut slot = self.transport.write().unwrap_or_else(|e| e.into_inner());
        slot.take().is_some()
    }

    /// Resolves a spec's endpoint and query parameters against the base URL.
    pub(crate) fn url_for(&self, spec: &RequestSpec) -> Result<Url> {
        resolve_url(&self.base_url, &spec.endpoint, &spec.options.query_params)
    }
}

/// Default headers for the transport: the configured headers plus an API key
/// header when `api_key` auth is configured.
pub(crate) fn default_headers(config: &ClientConfig) -> HeaderMap {
    let mut headers = config.headers().clone();
    if let Some(Credential::ApiKey { header, value }) = config.credential() {
        headers.insert(header.clone(), value.clone());
    }
    headers
}

/// Joins `endpoint` onto `base` the way a path relative to the base URL
/// would be: a leading `/` does not discard the base path.
pub(crate) fn resolve_url(base: &Url, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url = base.join(endpoint.trim_start_matches('/'))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// The parts of request building that differ only by builder type between
/// `reqwest::RequestBuilder` and `reqwest::blocking::RequestBuilder`.
pub(crate) trait PrepareRequest: Sized {
    fn with_headers(self, headers: HeaderMap) -> Self;
    fn with_basic_auth(self, username: &str, password: Option<&str>) -> Self;
    fn with_bearer_auth(self, token: &str) -> Self;
    fn with_json(self, body: &serde_json::Value) -> Self;
    fn with_form(self, fields: &[(String, String)]) -> Self;

    /// Applies the spec's headers and body, and the configured credential.
    fn prepare(self, spec: &RequestSpec, credential: Option<&Credential>) -> Self {
        let mut request = self.with_headers(spec.options.headers.clone());

        request = match credential {
            Some(Credential::Basic { username, password }) => {
                request.with_basic_auth(username, password.as_deref())
            }
            Some(Credential::Bearer(token)) => request.with_bearer_auth(token),
            // Sent as a default header.
            Some(Credential::ApiKey { .. }) | None => request,
        };

        match &spec.options.body {
            Some(RequestBody::Json(value)) => request.with_json(value),
            Some(RequestBody::Form(fields)) => request.with_form(fields),
            None => request,
        }
    }
}

impl PrepareRequest for reqwest::RequestBuilder {
    fn with_headers(self, headers: HeaderMap) -> Self {
        self.headers(headers)
    }

    fn with_basic_auth(self, username: &str, password: Option<&str>) -> Self {
        self.basic_auth(username, password)
    }

    fn with_bearer_auth(self, token: &str) -> Self {
        self.bearer_auth(token)
    }

    fn with_json(self, body: &serde_json::Value) -> Self {
        self.json(body)
    }

    fn with_form(self, fields: &[(String, String)]) -> Self {
        self.form(fields)
    }
}

impl PrepareRequest for reqwest::blocking::RequestBuilder {
    fn with_headers(self, headers: HeaderMap) -> Self {
        self.headers(headers)
    }

    fn with_basic_auth(self, username: &str, password: Option<&str>) -> Self {
        self.basic_auth(username, password)
    }

    fn with_bearer_auth(self, token: &str) -> Self {
        self.bearer_auth(token)
    }

    fn with_json(self, body: &serde_json::Value) -> Self {
        self.json(body)
    }

    fn with_form(self, fields: &[(String, String)]) -> Self {
        self.form(fields)
    }
}
