//! # apiclient - a retrying HTTP API client
//!
//! `apiclient` wraps `reqwest` with a small, predictable request pipeline:
//! every logical call becomes up to `retries` physical attempts, separated by
//! a fixed backoff. The resulting response is status-checked, decoded as JSON,
//! validated against a schema type and optionally transformed by a
//! post-process hook.
//!
//! Two clients share this pipeline:
//!
//! - [`Client`]: async. The backoff suspends the task.
//! - [`blocking::Client`]: blocking. The backoff blocks the calling thread.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiclient::{Client, ClientConfig, RequestBody};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apiclient::Error> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://api.example.com")?
//!         .retries(3)
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!     let client = Client::new(config)?;
//!
//!     let user = client.get::<User>("/users/123").await?;
//!     if let Some(user) = user.data() {
//!         println!("User: {}", user.name);
//!     }
//!
//!     let body = RequestBody::json(&serde_json::json!({"name": "Alice"}))?;
//!     let created = client.post::<User>("/users", body).await?;
//!     println!("Created after {} attempt(s)", created.attempts);
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! Only transient transport failures are retried: connection errors, DNS
//! failures, timeouts. A response with an error status is returned as
//! [`Error::HttpStatus`] straight away. `retries` counts total attempts, so
//! `retries = 0` makes no attempt at all and every call fails with
//! [`Error::RetryExhausted`].
//!
//! The timeout applies to each attempt separately. A call with `retries = 3`
//! and a 5 second timeout can take up to roughly 15 seconds plus two
//! backoffs.
//!
//! ## Post-processing
//!
//! ```no_run
//! use apiclient::{Client, ClientConfig, Payload};
//! use serde_json::{json, Value};
//!
//! # async fn example() -> Result<(), apiclient::Error> {
//! let config = ClientConfig::builder().base_url("https://api.example.com")?.build()?;
//! let client = Client::with_post_process(config, |body: Value| json!({ "wrapped": body }))?;
//!
//! let response = client.get::<Value>("/status").await?;
//! assert!(matches!(response.data, Payload::Processed(_)));
//! # Ok(())
//! # }
//! ```

pub mod blocking;
mod client;
pub mod config;
mod error;
mod processor;
mod request;
mod response;
pub mod retry;
mod transport;

pub use client::{ApiCallFuture, Client};
pub use config::{AuthCredentials, AuthType, ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use processor::{process, PostProcessHook, Schema};
pub use request::{RequestBody, RequestOptions, RequestSpec, Verb};
pub use response::{Payload, RawResponse, Response};
pub use retry::{Attempted, CallState, RetryPolicy, RetryRun};
