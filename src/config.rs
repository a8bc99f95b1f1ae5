//! Client configuration.
//!
//! [`ClientConfig`] is validated once, at construction, and is immutable
//! afterwards. Build it with [`ClientConfig::builder`] or load it from
//! `API_*` environment variables with [`ClientConfig::from_env`].

use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default number of attempts per logical call.
pub const DEFAULT_RETRIES: usize = 3;

/// Default per-attempt timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

/// Default fixed delay between two attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Header used for `api_key` auth when the credentials do not name one.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// The authentication scheme applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// HTTP basic auth from `{"username": .., "password": ..}` credentials.
    Basic,
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// An API key sent in a header (`X-API-Key` unless overridden).
    ApiKey,
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthType::Basic),
            "bearer" => Ok(AuthType::Bearer),
            "api_key" => Ok(AuthType::ApiKey),
            other => Err(Error::ConfigValidation(format!(
                "Unknown auth type '{}' (expected basic, bearer or api_key)",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthType::Basic => "basic",
            AuthType::Bearer => "bearer",
            AuthType::ApiKey => "api_key",
        })
    }
}

/// Authentication credentials, either a raw string or a JSON object.
#[derive(Clone, PartialEq)]
pub enum AuthCredentials {
    /// A plain token or key.
    Raw(String),
    /// Structured credentials, e.g. `{"username": "u", "password": "p"}`.
    Structured(Map<String, Value>),
}

impl AuthCredentials {
    /// Parses credentials from a string.
    ///
    /// A string holding a JSON object becomes [`AuthCredentials::Structured`].
    /// Anything else, including other JSON values, is kept verbatim as
    /// [`AuthCredentials::Raw`]. This never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiclient::AuthCredentials;
    ///
    /// let creds = AuthCredentials::parse(r#"{"username": "u", "password": "p"}"#);
    /// assert!(matches!(creds, AuthCredentials::Structured(_)));
    ///
    /// let creds = AuthCredentials::parse("s3cr3t");
    /// assert_eq!(creds, AuthCredentials::Raw("s3cr3t".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => AuthCredentials::Structured(map),
            _ => AuthCredentials::Raw(raw.to_string()),
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        match self {
            AuthCredentials::Structured(map) => map.get(name).and_then(Value::as_str),
            AuthCredentials::Raw(_) => None,
        }
    }

    fn required_field(&self, auth_type: AuthType, name: &str) -> Result<&str> {
        self.field(name).ok_or_else(|| {
            Error::ConfigValidation(format!(
                "{} auth credentials must have a string '{}' field",
                auth_type, name
            ))
        })
    }
}

impl From<&str> for AuthCredentials {
    fn from(raw: &str) -> Self {
        AuthCredentials::parse(raw)
    }
}

impl From<String> for AuthCredentials {
    fn from(raw: String) -> Self {
        AuthCredentials::parse(&raw)
    }
}

impl From<Map<String, Value>> for AuthCredentials {
    fn from(map: Map<String, Value>) -> Self {
        AuthCredentials::Structured(map)
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthCredentials::Raw(_) => f.write_str("Raw(<redacted>)"),
            AuthCredentials::Structured(map) => f
                .debug_tuple("Structured")
                .field(&map.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// A credential resolved from `auth_type` + `auth_credentials`, ready to be
/// attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum Credential {
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer(String),
    ApiKey {
        header: HeaderName,
        value: HeaderValue,
    },
}

impl Credential {
    /// Resolves the credential applied to requests.
    ///
    /// Missing credentials, or raw credentials that do not fit the scheme,
    /// resolve to `None` and requests go out without auth. A JSON object
    /// lacking the field the scheme needs is a configuration error.
    fn resolve(
        auth_type: AuthType,
        credentials: Option<&AuthCredentials>,
    ) -> Result<Option<Self>> {
        let Some(credentials) = credentials else {
            tracing::warn!(
                auth_type = %auth_type,
                "No auth credentials configured, sending requests without auth"
            );
            return Ok(None);
        };

        let credential = match (auth_type, credentials) {
            (AuthType::Basic, AuthCredentials::Raw(raw)) => {
                raw.split_once(':').map(|(username, password)| Credential::Basic {
                    username: username.to_string(),
                    password: Some(password.to_string()),
                })
            }
            (AuthType::Basic, AuthCredentials::Structured(_)) => Some(Credential::Basic {
                username: credentials.required_field(auth_type, "username")?.to_string(),
                password: credentials.field("password").map(str::to_string),
            }),
            (AuthType::Bearer, AuthCredentials::Raw(token)) => {
                Some(Credential::Bearer(token.clone()))
            }
            (AuthType::Bearer, AuthCredentials::Structured(_)) => Some(Credential::Bearer(
                credentials.required_field(auth_type, "token")?.to_string(),
            )),
            (AuthType::ApiKey, AuthCredentials::Raw(key)) => {
                api_key(DEFAULT_API_KEY_HEADER, key)
            }
            (AuthType::ApiKey, AuthCredentials::Structured(_)) => {
                let key = credentials.required_field(auth_type, "key")?;
                let header = credentials.field("header").unwrap_or(DEFAULT_API_KEY_HEADER);
                api_key(header, key)
            }
        };

        if credential.is_none() {
            tracing::warn!(
                auth_type = %auth_type,
                "Auth credentials do not fit the auth type, sending requests without auth"
            );
        }
        Ok(credential)
    }
}

fn api_key(header: &str, key: &str) -> Option<Credential> {
    let header = HeaderName::try_from(header).ok()?;
    let mut value = HeaderValue::try_from(key).ok()?;
    value.set_sensitive(true);
    Some(Credential::ApiKey { header, value })
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credential::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credential::ApiKey { header, .. } => f
                .debug_struct("ApiKey")
                .field("header", header)
                .field("value", &"<redacted>")
                .finish(),
        }
    }
}

/// Configuration for a [`Client`](crate::Client) or
/// [`blocking::Client`](crate::blocking::Client).
///
/// # Examples
///
/// ```
/// use apiclient::{AuthType, ClientConfig};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), apiclient::Error> {
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com//")?
///     .retries(5)
///     .timeout(Duration::from_secs(10))
///     .header("User-Agent", "my-app/1.0")?
///     .auth(AuthType::Bearer, "my-token")
///     .build()?;
///
/// assert_eq!(config.base_url(), "https://api.example.com/");
/// assert_eq!(config.retries(), 5);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    retries: usize,
    timeout: Option<Duration>,
    backoff: Duration,
    headers: HeaderMap,
    auth_type: Option<AuthType>,
    auth_credentials: Option<AuthCredentials>,
    credential: Option<Credential>,
}

impl ClientConfig {
    /// Creates a new [`ClientConfigBuilder`].
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Loads a configuration from `API_*` environment variables, with a
    /// `.env` file in the working directory as fallback.
    ///
    /// Reads:
    /// - `API_BASE_URL`: required
    /// - `API_RETRIES`: attempts per call, default 3
    /// - `API_TIMEOUT`: per-attempt timeout in seconds, default 5.0 (0 = none)
    /// - `API_AUTH_TYPE`: `basic`, `bearer` or `api_key`
    /// - `API_AUTH_CREDENTIALS`: a JSON object or a raw string
    ///
    /// Empty variables are treated as unset. Process environment variables
    /// take precedence over `.env` entries, and a missing `.env` file is
    /// ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_env_file(".env")
    }

    /// Like [`ClientConfig::from_env`], reading fallback values from the
    /// dotenv file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the file exists but cannot be
    /// parsed, or if the resulting configuration is invalid.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let file_vars = read_env_file(path.as_ref())?;
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Loads a configuration from `API_*` keys resolved through `lookup`.
    ///
    /// This is [`ClientConfig::from_env`] with the environment swapped for an
    /// arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = var("API_BASE_URL").ok_or_else(|| {
            Error::ConfigValidation("missing API_BASE_URL environment variable".to_string())
        })?;
        let mut builder = ClientConfigBuilder::new().base_url(base_url)?;

        if let Some(retries) = var("API_RETRIES") {
            let retries = retries.trim().parse::<usize>().map_err(|e| {
                Error::ConfigValidation(format!("Invalid API_RETRIES '{}': {}", retries, e))
            })?;
            builder = builder.retries(retries);
        }

        if let Some(timeout) = var("API_TIMEOUT") {
            let secs = timeout.trim().parse::<f64>().map_err(|e| {
                Error::ConfigValidation(format!("Invalid API_TIMEOUT '{}': {}", timeout, e))
            })?;
            builder = builder.timeout_secs(secs)?;
        }

        if let Some(auth_type) = var("API_AUTH_TYPE") {
            builder = builder.auth_type(auth_type.parse()?);
        }

        if let Some(credentials) = var("API_AUTH_CREDENTIALS") {
            builder = builder.auth_credentials(credentials);
        }

        builder.build()
    }

    /// The base URL, always ending with exactly one `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The number of attempts made per logical call.
    pub fn retries(&self) -> usize {
        self.retries
    }

    /// The per-attempt timeout, or `None` to wait indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The fixed delay between two attempts.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The configured auth scheme.
    pub fn auth_type(&self) -> Option<AuthType> {
        self.auth_type
    }

    /// The configured auth credentials.
    pub fn auth_credentials(&self) -> Option<&AuthCredentials> {
        self.auth_credentials.as_ref()
    }

    pub(crate) fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .field("headers", &self.headers)
            .field("auth_type", &self.auth_type)
            .field("auth_credentials", &self.auth_credentials)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    retries: usize,
    timeout: Option<Duration>,
    backoff: Duration,
    headers: HeaderMap,
    auth_type: Option<AuthType>,
    auth_credentials: Option<AuthCredentials>,
}

impl ClientConfigBuilder {
    /// Creates a builder with the default retries, timeout and backoff.
    pub fn new() -> Self {
        Self {
            base_url: None,
            retries: DEFAULT_RETRIES,
            timeout: Some(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS)),
            backoff: DEFAULT_BACKOFF,
            headers: HeaderMap::new(),
            auth_type: None,
            auth_credentials: None,
        }
    }

    /// Sets the base URL.
    ///
    /// The URL must use the `http` or `https` scheme. Trailing slashes are
    /// collapsed into exactly one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the URL is not a valid HTTP URL.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(normalize_base_url(url.as_ref())?);
        Ok(self)
    }

    /// Sets the number of attempts per logical call.
    ///
    /// `0` disables requests entirely: every call fails immediately with
    /// [`Error::RetryExhausted`] without touching the network.
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the per-attempt timeout. A zero duration waits indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Sets the per-attempt timeout in seconds. `0.0` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] for negative or non-finite values.
    pub fn timeout_secs(self, secs: f64) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::ConfigValidation(format!("Invalid timeout {}: {}", secs, e)))?;
        Ok(self.timeout(timeout))
    }

    /// Sets the fixed delay slept between two attempts.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigValidation(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigValidation(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds several headers sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error on the first invalid header name or value.
    pub fn headers<I, K, V>(self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .try_fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Sets the auth scheme.
    pub fn auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }

    /// Sets the auth credentials.
    ///
    /// Strings holding a JSON object are parsed into structured credentials.
    pub fn auth_credentials(mut self, credentials: impl Into<AuthCredentials>) -> Self {
        self.auth_credentials = Some(credentials.into());
        self
    }

    /// Sets the auth scheme and credentials together.
    pub fn auth(self, auth_type: AuthType, credentials: impl Into<AuthCredentials>) -> Self {
        self.auth_type(auth_type).auth_credentials(credentials)
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if no base URL was set, or if
    /// structured auth credentials lack the field the auth type needs.
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigValidation("Base URL is required".to_string()))?;

        let credential = match self.auth_type {
            Some(auth_type) => Credential::resolve(auth_type, self.auth_credentials.as_ref())?,
            None => None,
        };

        Ok(ClientConfig {
            base_url,
            retries: self.retries,
            timeout: self.timeout,
            backoff: self.backoff,
            headers: self.headers,
            auth_type: self.auth_type,
            auth_credentials: self.auth_credentials,
            credential,
        })
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(|e| {
                Error::ConfigValidation(format!("Invalid env file {}: {}", path.display(), e))
            }),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(Error::ConfigValidation(format!(
            "Failed to read env file {}: {}",
            path.display(),
            e
        ))),
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(Error::ConfigValidation(format!(
            "Invalid URL provided: {}",
            raw
        )));
    }

    let normalized = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| Error::ConfigValidation(format!("Invalid URL provided: {}: {}", raw, e)))?;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_base_url_gets_exactly_one_trailing_slash() {
        for raw in [
            "https://api.example.com",
            "https://api.example.com/",
            "https://api.example.com///",
        ] {
            let config = ClientConfig::builder().base_url(raw).unwrap().build().unwrap();
            assert_eq!(config.base_url(), "https://api.example.com/");
        }

        let config = ClientConfig::builder()
            .base_url("http://localhost:8080/v1")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "http://localhost:8080/v1/");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for raw in ["ftp://example.com", "example.com", "", "http://"] {
            let result = ClientConfig::builder().base_url(raw);
            assert!(
                matches!(result, Err(Error::ConfigValidation(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.retries(), 3);
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.backoff(), Duration::from_secs(1));
        assert!(config.headers().is_empty());
        assert_eq!(config.auth_type(), None);
        assert!(config.auth_credentials().is_none());
    }

    #[test]
    fn test_missing_base_url() {
        let result = ClientConfig::builder().build();
        assert!(matches!(result, Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_zero_timeout_waits_indefinitely() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .timeout_secs(0.0)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.timeout(), None);

        assert!(ClientConfig::builder().timeout_secs(-1.0).is_err());
        assert!(ClientConfig::builder().timeout_secs(f64::NAN).is_err());
    }

    #[test]
    fn test_auth_credentials_parsing() {
        let creds = AuthCredentials::parse(r#"{"username": "user", "password": "pass"}"#);
        match &creds {
            AuthCredentials::Structured(map) => {
                assert_eq!(map["username"], "user");
                assert_eq!(map["password"], "pass");
            }
            other => panic!("Expected structured credentials, got {:?}", other),
        }

        assert_eq!(
            AuthCredentials::parse("not json {"),
            AuthCredentials::Raw("not json {".to_string())
        );
        // Valid JSON that is not an object stays raw.
        assert_eq!(
            AuthCredentials::parse("12345"),
            AuthCredentials::Raw("12345".to_string())
        );
    }

    #[test]
    fn test_auth_type_parsing() {
        assert_eq!("basic".parse::<AuthType>().unwrap(), AuthType::Basic);
        assert_eq!("Bearer".parse::<AuthType>().unwrap(), AuthType::Bearer);
        assert_eq!("API_KEY".parse::<AuthType>().unwrap(), AuthType::ApiKey);
        assert!(matches!(
            "digest".parse::<AuthType>(),
            Err(Error::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_structured_credentials_need_their_field() {
        let builder = ClientConfig::builder()
            .base_url("https://api.example.com")
            .unwrap();

        let missing_username = builder
            .clone()
            .auth(AuthType::Basic, r#"{"password": "p"}"#)
            .build();
        assert!(matches!(missing_username, Err(Error::ConfigValidation(_))));

        let missing_token = builder.clone().auth(AuthType::Bearer, r#"{"user": "u"}"#).build();
        assert!(matches!(missing_token, Err(Error::ConfigValidation(_))));

        let basic = builder
            .clone()
            .auth(AuthType::Basic, r#"{"username": "u", "password": "p"}"#)
            .build()
            .unwrap();
        assert_eq!(
            basic.credential(),
            Some(&Credential::Basic {
                username: "u".to_string(),
                password: Some("p".to_string()),
            })
        );

        let api_key = builder
            .auth(AuthType::ApiKey, r#"{"header": "X-Token", "key": "k"}"#)
            .build()
            .unwrap();
        match api_key.credential() {
            Some(Credential::ApiKey { header, value }) => {
                assert_eq!(header.as_str(), "x-token");
                assert_eq!(value, "k");
            }
            other => panic!("Expected api key credential, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_credentials_never_fail_construction() {
        let builder = ClientConfig::builder()
            .base_url("https://api.example.com")
            .unwrap();

        let user_pass = builder
            .clone()
            .auth(AuthType::Basic, "user:pass")
            .build()
            .unwrap();
        assert_eq!(
            user_pass.credential(),
            Some(&Credential::Basic {
                username: "user".to_string(),
                password: Some("pass".to_string()),
            })
        );

        // Kept as configured, but no auth is sent.
        let no_colon = builder
            .clone()
            .auth(AuthType::Basic, "just-a-string")
            .build()
            .unwrap();
        assert_eq!(no_colon.auth_type(), Some(AuthType::Basic));
        assert_eq!(
            no_colon.auth_credentials(),
            Some(&AuthCredentials::Raw("just-a-string".to_string()))
        );
        assert_eq!(no_colon.credential(), None);

        let bad_key = builder
            .auth(AuthType::ApiKey, "line\nbreak")
            .build()
            .unwrap();
        assert_eq!(bad_key.credential(), None);
    }

    #[test]
    fn test_auth_type_without_credentials() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .auth_type(AuthType::Bearer)
            .build()
            .unwrap();
        assert_eq!(config.auth_type(), Some(AuthType::Bearer));
        assert_eq!(config.credential(), None);

        let config = ClientConfig::from_lookup(lookup(&[
            ("API_BASE_URL", "https://api.example.com"),
            ("API_AUTH_TYPE", "bearer"),
        ]))
        .unwrap();
        assert_eq!(config.auth_type(), Some(AuthType::Bearer));
        assert!(config.auth_credentials().is_none());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::Basic {
            username: "u".to_string(),
            password: Some("hunter2".to_string()),
        };
        let debug = format!("{:?}", credential);
        assert!(debug.contains("\"u\""));
        assert!(!debug.contains("hunter2"));
        assert!(!format!("{:?}", Credential::Bearer("tok".into())).contains("tok"));
    }

    #[test]
    fn test_env_file_values_fill_in_lookup() {
        let path = std::env::temp_dir().join(format!("apiclient-{}.env", std::process::id()));
        std::fs::write(
            &path,
            "API_BASE_URL=https://from-file.example.com\nAPI_RETRIES=7\n# comment\n",
        )
        .unwrap();

        let vars = read_env_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            vars.get("API_BASE_URL").map(String::as_str),
            Some("https://from-file.example.com")
        );
        let config = ClientConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.base_url(), "https://from-file.example.com/");
        assert_eq!(config.retries(), 7);
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let vars = read_env_file(Path::new("/nonexistent/apiclient/.env")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn test_debug_redacts_raw_credentials() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com")
            .unwrap()
            .auth(AuthType::Bearer, "super-secret")
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_lookup_defaults_and_overrides() {
        let config =
            ClientConfig::from_lookup(lookup(&[("API_BASE_URL", "https://api.example.com")]))
                .unwrap();
        assert_eq!(config.base_url(), "https://api.example.com/");
        assert_eq!(config.retries(), 3);
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));

        let config = ClientConfig::from_lookup(lookup(&[
            ("API_BASE_URL", "https://api.example.com/"),
            ("API_RETRIES", "5"),
            ("API_TIMEOUT", "2.5"),
            ("API_AUTH_TYPE", "basic"),
            ("API_AUTH_CREDENTIALS", r#"{"username": "u", "password": "p"}"#),
        ]))
        .unwrap();
        assert_eq!(config.retries(), 5);
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.auth_type(), Some(AuthType::Basic));
        assert!(matches!(
            config.auth_credentials(),
            Some(AuthCredentials::Structured(_))
        ));
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(Error::ConfigValidation(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[
                ("API_BASE_URL", "https://api.example.com"),
                ("API_RETRIES", "three"),
            ])),
            Err(Error::ConfigValidation(_))
        ));
    }
}
