//! Error types for API calls.
//!
//! Every failure a logical call can end in is a variant of [`Error`]. Errors
//! raised after a successful transport round-trip (status, decoding, schema)
//! keep the raw response body so they can be logged or inspected.

use http::{HeaderMap, StatusCode};

/// The main error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use apiclient::{Client, ClientConfig, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
/// let client = Client::new(config)?;
///
/// match client.get::<serde_json::Value>("/endpoint").await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(Error::HttpStatus { status, body, .. }) => {
///         eprintln!("HTTP error {}: {}", status, body);
///     }
///     Err(Error::RetryExhausted { endpoint, attempts, .. }) => {
///         eprintln!("{} unreachable after {} attempts", endpoint, attempts);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client configuration is invalid.
    ///
    /// Raised while building a [`ClientConfig`](crate::ClientConfig) or a
    /// client: bad base URL, bad header, unusable auth credentials or an
    /// unparsable environment value.
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    /// A network-level failure during one attempt (connection refused, DNS
    /// lookup failed, connection reset while reading the body...).
    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    /// A single attempt exceeded the configured per-attempt timeout.
    #[error("Request timed out")]
    Timeout,

    /// Every attempt failed with a transient transport error.
    ///
    /// `attempts` is zero when the client is configured with `retries = 0`,
    /// in which case `last_error` is `None`.
    #[error("Request to {endpoint} failed after {attempts} attempts")]
    RetryExhausted {
        /// The endpoint the call was made against.
        endpoint: String,
        /// The number of physical attempts made.
        attempts: usize,
        /// The transient error of the final attempt.
        #[source]
        last_error: Option<Box<Error>>,
    },

    /// The server answered with a non-success status code.
    ///
    /// These are never retried.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// The raw response body.
        body: String,
        /// The response headers.
        headers: HeaderMap,
    },

    /// The response body is not valid JSON.
    #[error("Malformed response (status {status}): {message}")]
    MalformedResponse {
        /// The raw response body.
        raw_response: String,
        /// The JSON decoder's message.
        message: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// The response body is valid JSON but does not match the requested schema.
    #[error("Response validation error: {message}")]
    ResponseValidation {
        /// What did not match, as reported by the deserializer.
        message: String,
        /// The raw response body.
        raw_response: String,
    },

    /// The HTTP method is not supported by the operation it was passed to.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The client was closed and can no longer issue requests.
    #[error("Client is closed")]
    Closed,

    /// A request body, or a schema value handed to the post-process hook,
    /// could not be encoded as JSON.
    #[error("Failed to serialize: {0}")]
    Serialization(String),

    /// The endpoint could not be resolved against the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(err)
        }
    }
}

impl Error {
    /// Returns `true` if this error is a transient transport failure that the
    /// retry executor may retry.
    ///
    /// Only network-level failures qualify. HTTP error statuses, decoding and
    /// schema errors, and errors raised while building the request are not
    /// transient.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::Error;
    /// use http::StatusCode;
    ///
    /// assert!(Error::Timeout.is_transient());
    ///
    /// let err = Error::HttpStatus {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     body: "try later".to_string(),
    ///     headers: http::HeaderMap::new(),
    /// };
    /// assert!(!err.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(err) => !err.is_builder(),
            Error::Timeout => true,
            Error::ConfigValidation(_)
            | Error::RetryExhausted { .. }
            | Error::HttpStatus { .. }
            | Error::MalformedResponse { .. }
            | Error::ResponseValidation { .. }
            | Error::UnsupportedMethod(_)
            | Error::Closed
            | Error::Serialization(_)
            | Error::InvalidUrl(_) => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::MalformedResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpStatus { body, .. } => Some(body),
            Error::MalformedResponse { raw_response, .. } => Some(raw_response),
            Error::ResponseValidation { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the number of attempts made for a `RetryExhausted` error.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Error::RetryExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;
