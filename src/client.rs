//! Async HTTP client with retry logic, schema validation and post-processing.
//!
//! The [`Client`] type is the cooperative variant: attempts run as futures and
//! the backoff between attempts suspends the task instead of blocking a
//! thread. See [`blocking::Client`](crate::blocking::Client) for the variant
//! that blocks the calling thread.

use crate::processor::{self, PostProcessHook, Schema};
use crate::transport::{self, PrepareRequest, Shared};
use crate::{
    Attempted, ClientConfig, Error, Payload, RawResponse, RequestBody, RequestOptions, RequestSpec,
    Response, Result, Verb,
};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// The future returned by the closures built with [`Client::api_call`].
pub type ApiCallFuture<'a, S> =
    Pin<Box<dyn Future<Output = Result<Response<Payload<S>>>> + Send + 'a>>;

/// An async API client.
///
/// The client is designed to be reused across many calls. Clones share the
/// same configuration and connection pool.
///
/// # Examples
///
/// ```no_run
/// use apiclient::{Client, ClientConfig, RequestBody};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), apiclient::Error> {
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com")?
///     .retries(3)
///     .build()?;
/// let client = Client::new(config)?;
///
/// // Untyped GET
/// let response = client.get::<serde_json::Value>("/users/123").await?;
/// println!("{:?}", response.data);
///
/// // Typed POST
/// let body = RequestBody::json(&json!({"name": "Alice"}))?;
/// let created = client.post::<User>("/users", body).await?;
/// if let Some(user) = created.data() {
///     println!("Created user with ID: {}", user.id);
/// }
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Shared<reqwest::Client>>,

    /// Transform applied to every decoded response body.
    ///
    /// Replacing the hook needs `&mut self`, so it cannot race with calls in
    /// flight on this value. Each clone carries its own hook. Callers that
    /// share one hook across tasks through their own interior mutability
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
        let mut builder =
            reqwest::Client::builder().default_headers(transport::default_headers(&config));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            Error::ConfigValidation(format!("Failed to build HTTP client: {}", e))
        })?;

        tracing::debug!(config = ?config, "Initialized API client");

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
    /// The body is validated as `S` (use `serde_json::Value` for untyped
    /// calls) and passed through the post-process hook, if any.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedMethod`] for `HEAD` and `OPTIONS` specs; use
    ///   [`Client::fetch`] for those
    /// - [`Error::RetryExhausted`] if every attempt failed transiently
    /// - [`Error::HttpStatus`] for non-2xx responses
    /// - [`Error::MalformedResponse`] / [`Error::ResponseValidation`] for
    ///   bodies that are not JSON or do not match `S`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiclient::{Client, ClientConfig, RequestSpec, Verb};
    ///
    /// # async fn example() -> Result<(), apiclient::Error> {
    /// # let client = Client::new(ClientConfig::builder().base_url("https://api.example.com")?.build()?)?;
    /// let spec = RequestSpec::new(Verb::Get, "/search")
    ///     .with_query_param("q", "rust")
    ///     .with_header("X-Request-Id", "42")?;
    ///
    /// let response = client.call::<serde_json::Value>(spec).await?;
    /// println!("{:?}", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<S: Schema>(&self, spec: RequestSpec) -> Result<Response<Payload<S>>> {
        if !spec.verb.decodes_body() {
            return Err(Error::UnsupportedMethod(format!(
                "{} responses are not decoded; use fetch",
                spec.verb
            )));
        }

        let start_time = Instant::now();
        let attempted = self.send(&spec).await?;
        processor::process(
            attempted.value,
            self.post_process.as_ref(),
            start_time.elapsed(),
            attempted.attempts,
        )
    }

    /// Makes a call and returns the raw response without decoding it.
    ///
    /// Retries and the status check apply as for [`Client::call`].
    pub async fn fetch(&self, spec: RequestSpec) -> Result<RawResponse> {
        self.send(&spec).await.map(|attempted| attempted.value)
    }

    /// Makes a call by verb name, e.g. `"get"` or `"POST"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for unknown verbs, and for `HEAD`
    /// and `OPTIONS`, whose responses are not decoded.
    pub async fn request<S: Schema>(
        &self,
        method: &str,
        endpoint: impl Into<String>,
        options: RequestOptions,
    ) -> Result<Response<Payload<S>>> {
        let verb: Verb = method.parse()?;
        self.call(RequestSpec::new(verb, endpoint).with_options(options))
            .await
    }

    /// Builds a reusable call for one endpoint, method and schema.
    ///
    /// The returned closure takes per-call [`RequestOptions`] and delegates to
    /// [`Client::request`]. An unsupported method is reported when the
    /// closure is invoked.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiclient::{Client, ClientConfig, RequestOptions};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize, Deserialize)]
    /// struct Users { users: Vec<String> }
    ///
    /// # async fn example() -> Result<(), apiclient::Error> {
    /// # let client = Client::new(ClientConfig::builder().base_url("https://api.example.com")?.build()?)?;
    /// let list_users = client.api_call::<Users>("/users", "get");
    ///
    /// let first_page = list_users(RequestOptions::new().with_query_param("page", "1")).await?;
    /// let second_page = list_users(RequestOptions::new().with_query_param("page", "2")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn api_call<'a, S>(
        &'a self,
        endpoint: impl Into<String>,
        method: impl Into<String>,
    ) -> impl Fn(RequestOptions) -> ApiCallFuture<'a, S> + 'a
    where
        S: Schema + Send + 'a,
    {
        let endpoint = endpoint.into();
        let method = method.into();
        move |options| {
            let endpoint = endpoint.clone();
            let method = method.clone();
            Box::pin(async move { self.request::<S>(&method, endpoint, options).await })
        }
    }

    /// Makes a GET request.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiclient::{Client, ClientConfig};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize, Deserialize)]
    /// struct User { name: String }
    ///
    /// # async fn example() -> Result<(), apiclient::Error> {
    /// # let client = Client::new(ClientConfig::builder().base_url("https://api.example.com")?.build()?)?;
    /// let user = client.get::<User>("/users/123").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get<S: Schema>(&self, endpoint: impl Into<String>) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Get, endpoint)).await
    }

    /// Makes a POST request with a JSON or form body.
    pub async fn post<S: Schema>(
        &self,
        endpoint: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Post, endpoint).with_body(body))
            .await
    }

    /// Makes a PUT request with a JSON or form body.
    pub async fn put<S: Schema>(
        &self,
        endpoint: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Put, endpoint).with_body(body))
            .await
    }

    /// Makes a PATCH request with a JSON or form body.
    pub async fn patch<S: Schema>(
        &self,
        endpoint: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Patch, endpoint).with_body(body))
            .await
    }

    /// Makes a DELETE request.
    pub async fn delete<S: Schema>(
        &self,
        endpoint: impl Into<String>,
    ) -> Result<Response<Payload<S>>> {
        self.call(RequestSpec::new(Verb::Delete, endpoint)).await
    }

    /// Makes a HEAD request and returns the raw response.
    pub async fn head(&self, endpoint: impl Into<String>) -> Result<RawResponse> {
        self.fetch(RequestSpec::new(Verb::Head, endpoint)).await
    }

    /// Makes an OPTIONS request and returns the raw response.
    pub async fn options(&self, endpoint: impl Into<String>) -> Result<RawResponse> {
        self.fetch(RequestSpec::new(Verb::Options, endpoint)).await
    }

    /// Releases the connection pool.
    ///
    /// Closing affects every clone of this client. It is safe to call more
    /// than once, and on a client that never made a request. Calls made
    /// afterwards fail with [`Error::Closed`].
    pub fn close(&self) {
        if self.inner.close() {
            tracing::debug!(base_url = %self.inner.base_url, "Closed API client");
        }
    }

    /// Runs the retry executor for `spec`, then checks the response status.
    async fn send(&self, spec: &RequestSpec) -> Result<Attempted<RawResponse>> {
        let url = self.inner.url_for(spec)?;
        let start_time = Instant::now();

        let attempted = self
            .inner
            .policy
            .execute_async(&spec.endpoint, |attempt| {
                self.execute_attempt(spec, url.clone(), attempt)
            })
            .await?;

        log_response(spec, &attempted.value, start_time.elapsed(), attempted.attempts);

        let value = attempted.value.error_for_status()?;
        Ok(Attempted {
            value,
            attempts: attempted.attempts,
        })
    }

    /// Executes a single physical attempt, reading the full body.
    async fn execute_attempt(
        &self,
        spec: &RequestSpec,
        url: Url,
        attempt: usize,
    ) -> Result<RawResponse> {
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
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

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
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

/// Logs a completed round-trip the way both clients report it.
pub(crate) fn log_response(
    spec: &RequestSpec,
    response: &RawResponse,
    latency: Duration,
    attempts: usize,
) {
    let status = response.status;

    tracing::info!(
        method = %spec.verb,
        endpoint = %spec.endpoint,
        status = status.as_u16(),
        latency_ms = latency.as_millis(),
        attempts = attempts,
        "Received HTTP response"
    );

    if status.is_client_error() {
        tracing::error!(
            status = status.as_u16(),
            response = %response.text(),
            "Client error (4xx)"
        );
    } else if status.is_server_error() {
        tracing::warn!(
            status = status.as_u16(),
            response = %response.text(),
            "Server error (5xx)"
        );
    }
}
