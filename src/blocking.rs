//! A blocking API client.
//!
//! [`Client`] has the same contract as the async [`crate::Client`]: the
//! same verbs, the same retry and failure semantics. Each call runs on the
//! calling thread and the backoff between attempts blocks that thread.
//!
//! Like `reqwest::blocking`, this client must not be used from within an
//! async runtime; use `tokio::task::spawn_blocking` there.

use crate::client::log_response;
use crate::processor::{self, PostProcessHook, Schema};
use crate::transport::{self, PrepareRequest, Shared};
use crate::{
    Attempted, ClientConfig, Error, Payload, RawResponse, RequestBody, RequestOptions,
    RequestSpec, Response, Result, Verb,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// A blocking API client.
///
/// # Examples
///
/// ```no_run
/// use apiclient::blocking::Client;
/// use apiclient::ClientConfig;
///
/// # fn main() -> Result<(), apiclient::Error> {
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
/// let client = Client::new(config)?;
///
/// let response = client.get::<serde_json::Value>("/status")?;
/// println!("{:?} after {} attempt(s)", response.data, response.attempts);
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Shared<reqwest::blocking::Client>>,

    /// Transform applied to every decoded response body.
    ///
    /// Replacing the hook needs `&mut self`, so it cannot race with calls in
    /// flight on this value. Each clone carries its own hook. Callers that
    /// share one hook across threads through their own interior mutability
    /// must synchronize it themselves.
    pub post_process: Option<PostProcessHook>,
}

impl Client {
    /// Creates a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the HTTP transport cannot be
    /// built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        // The blocking builder defaults to a 30s timeout; `None` must be explicit.
        let http_client = reqwest::blocking::Client::builder()
            .default_headers(transport::default_headers(&config))
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                Error::ConfigValidation(format!("Failed to build HTTP client: {}", e))
            })?;

        tracing::debug!(config = ?config, "Initialized blocking API client");

        Ok(Self {
            inner: Arc::new(Shared::new(config, http_client)?),
            post_process: None,
        })
    }

    /// Creates a client with a post-process hook already registered.
    pub fn with_post_process<F>(config: ClientConfig, hook: F) -> Result<Self>
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        let mut client = Self::new(config)?;
        client.set_post_process(Some(Arc::new(hook)));
        Ok(client)
    }

    /// Replaces the post-process hook. `None` removes it.
    pub fn set_post_process(&mut self, hook: Option<PostProcessHook>) {
        tracing::debug!(registered = hook.is_some(), "Set post-process hook");
        self.post_process = hook;
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Makes a call that decodes its response body.
    ///
    /// See [`crate::Client::call`].
    pub fn call<S: Schema>(&self, spec: RequestSpec) -> Result<Response<Payload<S>>> {
        if !spec.verb.decodes_body() {
            return Err(Error::UnsupportedMethod(format!(
                "{} responses are not decoded; use fetch",
                spec.verb
            )));
        }

        let start_time = Instant::now();
        let attempted = self.send(&spec)?;
        processor::process(
            attempted.value,
            self.post_process.as_ref(),
            start_time.elapsed(),
            attempted.attempts,
        )
    }

    /// Makes a call and returns the raw response without decoding it.
    pub fn fetch(&self, spec: RequestSpec) -> Result<RawResponse> {
        self.send(&spec).map(|attempted| attempted.value)
    }

    /// Makes a call by verb name, e.g. `"get"` or `"POST"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for unknown verbs, and for `HEAD`
    /// and `OPTIONS`, whose responses are not decoded.
    pub fn request<S: Schema>(
        &self,
        method: &str,
        endpoint: impl Into<String>,
        options: RequestOptions,
    ) -> Result<Response<Payload<S>>> {
        let verb: Verb = method.parse()?;
        self.call(RequestSpec::new(verb, endpoint).with_options(options))
    }

    /// Builds a reusable call for one endpoint, method and schema.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiclient::{blocking::Client, ClientConfig, RequestOptions};
    ///
    /// # fn main() -> Result<(), apiclient::Error> {
    /// # let client = Client::new(ClientConfig::builder().base_url("https://api.example.com")?.build()?)?;
    /// let get_user = client.api_call::<serde_json::Value>("/users/me", "get");
    /// let me = get_user(RequestOptions::new())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn api_call<'a, S>(
        &'a self,
        endpoint: impl Into<String>,
        method: impl Into<String>,
    ) -> impl Fn(RequestOptions) -> Result<Response<Payload<S>>> + 'a
    where
        S: Schema + 'a,
    {
        let endpoint = endpoint.into();
        let method = method.into();
        move |options| self.request::<S>(&method, endpoint.as_str(), options)
    }

    /// Makes a GET request.
    pub fn get<S: Schema>(&self, endpoint: impl Into<String>) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Get, endpoint))
    }

    /// Makes a POST request with a JSON or form body.
    pub fn post<S: Schema>(
        &self,
        endpoint: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Post, endpoint).with_body(body))
    }

    /// Makes a PUT request with a JSON or form body.
    pub fn put<S: Schema>(
        &self,
        endpoint: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Put, endpoint).with_body(body))
    }

    /// Makes a PATCH request with a JSON or form body.
    pub fn patch<S: Schema>(
        &self,
        endpoint: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Patch, endpoint).with_body(body))
    }

    /// Makes a DELETE request.
    pub fn delete<S: Schema>(&self, endpoint: impl Into<String>) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Delete, endpoint))
    }

    /// Makes a HEAD request and returns the raw response.
    pub fn head(&self, endpoint: impl Into<String>) -> Result<RawResponse> {
        self.fetch(RequestSpec::new(Verb::Head, endpoint))
    }

    /// Makes an OPTIONS request and returns the raw response.
    pub fn options(&self, endpoint: impl Into<String>) -> Result<RawResponse> {
        self.fetch(RequestSpec::new(Verb::Options, endpoint))
    }

    /// Releases the connection pool.
    ///
    /// See [`crate::Client::close`].
    pub fn close(&self) {
        if self.inner.close() {
            tracing::debug!(base_url = %self.inner.base_url, "Closed blocking API client");
        }
    }

    fn send(&self, spec: &RequestSpec) -> Result<Attempted<RawResponse>> {
        let url = self.inner.url_for(spec)?;
        let start_time = Instant::now();

        let attempted = self
            .inner
            .policy
            .execute(&spec.endpoint, |attempt| {
                self.execute_attempt(spec, url.clone(), attempt)
            })?;

        log_response(spec, &attempted.value, start_time.elapsed(), attempted.attempts);

        let value = attempted.value.error_for_status()?;
        Ok(Attempted {
            value,
            attempts: attempted.attempts,
        })
    }

    fn execute_attempt(&self, spec: &RequestSpec, url: Url, attempt: usize) -> Result<RawResponse> {
        let http_client = self.inner.transport()?;

        tracing::debug!(
            method = %spec.verb,
            url = %url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let response = http_client
            .request(spec.verb.method(), url.clone())
            .prepare(spec, self.inner.config.credential())
            .send()?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;

        Ok(RawResponse {
            status,
            headers,
            body,
            url,
        })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("blocking::Client")
            .field("config", &self.inner.config)
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}
