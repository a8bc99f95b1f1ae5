//! Response processing: JSON decoding, schema validation and post-processing.

use crate::{Error, Payload, RawResponse, Response, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A user-supplied transform applied to every decoded response body.
///
/// The hook receives the schema-validated value re-encoded as JSON, and its
/// output is returned to the caller as [`Payload::Processed`].
pub type PostProcessHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A type response bodies can be validated against.
///
/// Any serde type that can be both decoded and re-encoded qualifies. Use
/// `serde_json::Value` to skip validation.
pub trait Schema: DeserializeOwned + Serialize {}

impl<T: DeserializeOwned + Serialize> Schema for T {}

/// Turns a raw response into a [`Response`] carrying a [`Payload`].
///
/// The body is decoded as JSON, validated as `S`, and passed through `hook`
/// when one is given.
///
/// # Errors
///
/// - [`Error::MalformedResponse`] if the body is not valid JSON
/// - [`Error::ResponseValidation`] if the JSON does not match `S`
/// - [`Error::Serialization`] if the validated value cannot be re-encoded for
///   the hook
pub fn process<S: Schema>(
    raw: RawResponse,
    hook: Option<&PostProcessHook>,
    latency: Duration,
    attempts: usize,
) -> Result<Response<Payload<S>>> {
    let raw_body = raw.text();

    let decoded: Value = serde_json::from_slice(&raw.body).map_err(|e| {
        tracing::error!(
            error = %e,
            raw_response = %raw_body,
            "Failed to decode response body"
        );
        Error::MalformedResponse {
            raw_response: raw_body.clone(),
            message: e.to_string(),
            status: raw.status,
        }
    })?;

    let data: S = serde_json::from_value(decoded).map_err(|e| {
        tracing::error!(
            error = %e,
            schema = std::any::type_name::<S>(),
            "Response validation error"
        );
        Error::ResponseValidation {
            message: e.to_string(),
            raw_response: raw_body.clone(),
        }
    })?;

    let payload = match hook {
        Some(hook) => {
            let value =
                serde_json::to_value(&data).map_err(|e| Error::Serialization(e.to_string()))?;
            let processed = hook(value);
            tracing::debug!("Applied post-process hook");
            Payload::Processed(processed)
        }
        None => Payload::Data(data),
    };

    Ok(Response::new(
        payload,
        raw_body,
        raw.status,
        raw.headers,
        latency,
        attempts,
    ))
}
