//! Response types.
//!
//! A physical attempt yields a [`RawResponse`]. Body-decoding verbs turn it
//! into a [`Response`] whose `data` is a [`Payload`]: either the value
//! validated against the caller's schema type, or the output of the client's
//! post-process hook.

use crate::{Error, Result};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// The status, headers and body of one HTTP exchange, as read off the wire.
///
/// `HEAD` and `OPTIONS` calls return this directly.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The full response body.
    pub body: Bytes,

    /// The URL the request was sent to.
    pub url: Url,
}

impl RawResponse {
    /// Returns the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the response unchanged if its status is 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpStatus`] carrying the status, body and headers
    /// otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::{Error, RawResponse};
    /// use http::{HeaderMap, StatusCode};
    ///
    /// let response = RawResponse {
    ///     status: StatusCode::NOT_FOUND,
    ///     headers: HeaderMap::new(),
    ///     body: "no such user".into(),
    ///     url: "https://api.example.com/users/9".parse().unwrap(),
    /// };
    ///
    /// match response.error_for_status() {
    ///     Err(Error::HttpStatus { status, body, .. }) => {
    ///         assert_eq!(status, StatusCode::NOT_FOUND);
    ///         assert_eq!(body, "no such user");
    ///     }
    ///     other => panic!("unexpected {:?}", other),
    /// }
    /// ```
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }

        Err(Error::HttpStatus {
            status: self.status,
            body: self.text(),
            headers: self.headers,
        })
    }
}

/// The result of processing a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<S> {
    /// The decoded body, validated as the schema type `S`.
    ///
    /// Untyped calls use `S = serde_json::Value`.
    Data(S),

    /// The output of the client's post-process hook.
    Processed(Value),
}

impl<S> Payload<S> {
    /// Returns the schema value, unless a hook replaced it.
    pub fn data(&self) -> Option<&S> {
        match self {
            Payload::Data(data) => Some(data),
            Payload::Processed(_) => None,
        }
    }

    /// Consumes the payload and returns the schema value, unless a hook
    /// replaced it.
    pub fn into_data(self) -> Option<S> {
        match self {
            Payload::Data(data) => Some(data),
            Payload::Processed(_) => None,
        }
    }

    /// Returns the hook output, if a hook ran.
    pub fn processed(&self) -> Option<&Value> {
        match self {
            Payload::Data(_) => None,
            Payload::Processed(value) => Some(value),
        }
    }

    /// Returns `true` if a post-process hook produced this payload.
    pub fn is_processed(&self) -> bool {
        matches!(self, Payload::Processed(_))
    }
}

impl<S: Serialize> Payload<S> {
    /// Converts the payload into a JSON value, whichever form it has.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the schema value cannot be encoded.
    pub fn into_value(self) -> Result<Value> {
        match self {
            Payload::Data(data) => {
                serde_json::to_value(data).map_err(|e| Error::Serialization(e.to_string()))
            }
            Payload::Processed(value) => Ok(value),
        }
    }
}

/// A wrapper around a successfully processed response.
///
/// This type provides both the processed data and metadata about the HTTP
/// transaction: latency, status code, headers, attempt count and raw body.
///
/// # Examples
///
/// ```no_run
/// use apiclient::{Client, ClientConfig};
/// use serde::{Deserialize, Serialize};
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
///     .build()?;
/// let client = Client::new(config)?;
///
/// let response = client.get::<User>("/users/123").await?;
///
/// if let Some(user) = response.data() {
///     println!("User: {}", user.name);
/// }
/// println!("Request took {:?}", response.latency);
/// println!("Attempts: {}", response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The processed response data.
    pub data: T,

    /// The raw response body as a string.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The total latency of the call, including all attempts and backoff.
    pub latency: Duration,

    /// The number of attempts made to complete this call.
    ///
    /// This is `1` for calls that succeeded on the first try.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the response data to a different type using the provided function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use apiclient::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the call needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
