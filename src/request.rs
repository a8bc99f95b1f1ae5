//! Request description types.
//!
//! A [`RequestSpec`] describes one logical call: the verb, the endpoint and
//! the [`RequestOptions`] (query parameters, extra headers, body). It lives
//! for the duration of a single call and is reused for every retry attempt.

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The HTTP verbs the client facades expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl Verb {
    /// The corresponding [`http::Method`].
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
            Verb::Head => Method::HEAD,
            Verb::Options => Method::OPTIONS,
        }
    }

    /// Returns `true` if responses to this verb are decoded as JSON.
    ///
    /// `HEAD` and `OPTIONS` responses are returned as raw metadata instead.
    pub fn decodes_body(self) -> bool {
        !matches!(self, Verb::Head | Verb::Options)
    }
}

impl FromStr for Verb {
    type Err = Error;

    /// Parses a verb name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] for any other method name.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            "HEAD" => Ok(Verb::Head),
            "OPTIONS" => Ok(Verb::Options),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// A request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A JSON document, sent as `application/json`.
    Json(Value),
    /// Form fields, sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Serializes `body` into a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `body` cannot be represented as JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::RequestBody;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct NewUser { name: String }
    ///
    /// let body = RequestBody::json(&NewUser { name: "Alice".into() }).unwrap();
    /// assert_eq!(body, RequestBody::Json(serde_json::json!({"name": "Alice"})));
    /// ```
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Builds a form body from key/value pairs.
    pub fn form<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Per-call options: query parameters, extra headers and an optional body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters appended to the URL, in order.
    pub query_params: Vec<(String, String)>,

    /// Headers added on top of the client's default headers.
    pub headers: HeaderMap,

    /// The request body, if any.
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigValidation(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigValidation(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Adds multiple query parameters to the request.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A complete description of one logical call.
///
/// # Examples
///
/// ```
/// use apiclient::{RequestSpec, Verb};
///
/// let spec = RequestSpec::new(Verb::Get, "/users")
///     .with_query_param("page", "2")
///     .with_header("X-Request-Id", "abc")
///     .unwrap();
///
/// assert_eq!(spec.verb, Verb::Get);
/// assert_eq!(spec.options.query_params, vec![("page".to_string(), "2".to_string())]);
/// ```
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The HTTP verb.
    pub verb: Verb,

    /// The endpoint, relative to the client's base URL.
    pub endpoint: String,

    /// Query parameters, headers and body.
    pub options: RequestOptions,
}

impl RequestSpec {
    /// Creates a spec with no query parameters, headers or body.
    pub fn new(verb: Verb, endpoint: impl Into<String>) -> Self {
        Self {
            verb,
            endpoint: endpoint.into(),
            options: RequestOptions::default(),
        }
    }

    /// Replaces the spec's options.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        self.options = self.options.with_header(name, value)?;
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options = self.options.with_query_param(key, value);
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.options = self.options.with_body(body);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_parsing_ignores_case() {
        assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("Patch".parse::<Verb>().unwrap(), Verb::Patch);
        assert_eq!("OPTIONS".parse::<Verb>().unwrap(), Verb::Options);

        match "TRACE".parse::<Verb>() {
            Err(Error::UnsupportedMethod(method)) => assert_eq!(method, "TRACE"),
            other => panic!("Expected UnsupportedMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_head_and_options_skip_decoding() {
        assert!(Verb::Get.decodes_body());
        assert!(Verb::Delete.decodes_body());
        assert!(!Verb::Head.decodes_body());
        assert!(!Verb::Options.decodes_body());
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let result = RequestOptions::new().with_header("bad header", "value");
        assert!(matches!(result, Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_query_params_keep_order_and_duplicates() {
        let options = RequestOptions::new()
            .with_query_param("tag", "a")
            .with_query_param("tag", "b");
        assert_eq!(
            options.query_params,
            vec![
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string())
            ]
        );
    }
}
