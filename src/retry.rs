//! The retry executor.
//!
//! A logical call is driven by a [`RetryRun`], a small state machine shared by
//! the blocking and the async clients:
//!
//! ```text
//! Pending -> Attempting -> Succeeded
//!                       -> Retrying -> Attempting ...
//!                       -> Exhausted
//! ```
//!
//! Only transient transport failures (see [`Error::is_transient`]) move a run
//! to `Retrying`. HTTP error statuses never reach the executor: they are
//! checked by the client after a successful round-trip.
//!
//! [`RetryPolicy::execute`] and [`RetryPolicy::execute_async`] drive a run to
//! completion. They differ only in how they wait out the backoff: the first
//! sleeps the calling thread, the second suspends on `tokio::time::sleep`.

use crate::{ClientConfig, Error, Result};
use std::future::Future;
use std::time::Duration;

/// How many attempts a call gets and how long to wait between them.
///
/// # Examples
///
/// ```
/// use apiclient::{Error, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::ZERO);
///
/// let mut calls = 0;
/// let result = policy.execute("/flaky", |_attempt| {
///     calls += 1;
///     if calls < 3 { Err(Error::Timeout) } else { Ok("done") }
/// });
///
/// let outcome = result.unwrap();
/// assert_eq!(outcome.value, "done");
/// assert_eq!(outcome.attempts, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts. Zero means no attempt is ever made.
    pub retries: usize,

    /// Fixed delay between two attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(retries: usize, backoff: Duration) -> Self {
        Self { retries, backoff }
    }

    /// The policy described by a client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retries(), config.backoff())
    }

    /// Starts a new run for a call against `endpoint`.
    pub fn start<'a>(&'a self, endpoint: &'a str) -> RetryRun<'a> {
        RetryRun {
            policy: self,
            endpoint,
            state: CallState::Pending,
            last_error: None,
        }
    }

    /// Runs `attempt` until it succeeds, blocking the thread during backoff.
    ///
    /// `attempt` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetryExhausted`] when every attempt failed
    /// transiently, or the attempt's own error when it is not transient.
    pub fn execute<T, F>(&self, endpoint: &str, mut attempt: F) -> Result<Attempted<T>>
    where
        F: FnMut(usize) -> Result<T>,
    {
        let mut run = self.start(endpoint);
        while let Some(number) = run.begin() {
            match attempt(number) {
                Ok(value) => return Ok(run.succeed(value)),
                Err(err) => {
                    if let Some(delay) = run.fail(err)? {
                        std::thread::sleep(delay);
                    }
                }
            }
        }
        Err(run.into_error())
    }

    /// Runs `attempt` until it succeeds, suspending the task during backoff.
    ///
    /// Same contract as [`RetryPolicy::execute`].
    pub async fn execute_async<T, F, Fut>(&self, endpoint: &str, mut attempt: F) -> Result<Attempted<T>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut run = self.start(endpoint);
        while let Some(number) = run.begin() {
            match attempt(number).await {
                Ok(value) => return Ok(run.succeed(value)),
                Err(err) => {
                    if let Some(delay) = run.fail(err)? {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(run.into_error())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RETRIES, crate::config::DEFAULT_BACKOFF)
    }
}

/// The value produced by a successful run, with the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    /// The successful attempt's output.
    pub value: T,
    /// How many attempts were made, including the successful one.
    pub attempts: usize,
}

/// Where a logical call is in its lifecycle.
///
/// Each variant except `Pending` carries the number of the current or last
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No attempt started yet.
    Pending,
    /// An attempt is in flight.
    Attempting(usize),
    /// An attempt failed transiently; the backoff is running.
    Retrying(usize),
    /// An attempt succeeded. Terminal.
    Succeeded(usize),
    /// No attempts remain. Terminal.
    Exhausted(usize),
    /// An attempt failed with a non-transient error. Terminal.
    Aborted(usize),
}

impl CallState {
    /// Returns `true` for the terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallState::Succeeded(_) | CallState::Exhausted(_) | CallState::Aborted(_)
        )
    }
}

/// The retry state machine for one logical call.
///
/// Drivers call [`begin`](RetryRun::begin) before every attempt, then either
/// [`succeed`](RetryRun::succeed) or [`fail`](RetryRun::fail), and finally
/// [`into_error`](RetryRun::into_error) once `begin` returns `None`.
#[derive(Debug)]
pub struct RetryRun<'a> {
    policy: &'a RetryPolicy,
    endpoint: &'a str,
    state: CallState,
    last_error: Option<Error>,
}

impl RetryRun<'_> {
    /// The current state.
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Moves to the next attempt and returns its number, or `None` when the
    /// run is over.
    pub fn begin(&mut self) -> Option<usize> {
        let next = match self.state {
            CallState::Pending => 1,
            CallState::Retrying(n) => n + 1,
            _ => return None,
        };

        if next > self.policy.retries {
            self.state = CallState::Exhausted(next - 1);
            return None;
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            attempt = next,
            max_attempts = self.policy.retries,
            "Starting attempt"
        );
        self.state = CallState::Attempting(next);
        Some(next)
    }

    /// Records a successful attempt.
    pub fn succeed<T>(&mut self, value: T) -> Attempted<T> {
        let attempts = self.current_attempt();
        self.state = CallState::Succeeded(attempts);
        Attempted { value, attempts }
    }

    /// Records a failed attempt.
    ///
    /// Returns the delay to wait before the next attempt, or `None` when this
    /// was the last one.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged if it is not transient; the run is then over.
    pub fn fail(&mut self, error: Error) -> Result<Option<Duration>> {
        let attempt = self.current_attempt();

        if !error.is_transient() {
            self.state = CallState::Aborted(attempt);
            return Err(error);
        }

        tracing::warn!(
            error = %error,
            endpoint = %self.endpoint,
            attempt = attempt,
            "Request attempt failed"
        );
        self.last_error = Some(error);

        if attempt >= self.policy.retries {
            self.state = CallState::Exhausted(attempt);
            return Ok(None);
        }

        tracing::info!(
            delay_ms = self.policy.backoff.as_millis(),
            attempt = attempt,
            "Retrying request after delay"
        );
        self.state = CallState::Retrying(attempt);
        Ok(Some(self.policy.backoff))
    }

    /// Ends an exhausted run, producing [`Error::RetryExhausted`].
    pub fn into_error(self) -> Error {
        let attempts = self.current_attempt();
        tracing::error!(
            endpoint = %self.endpoint,
            attempts = attempts,
            "Request failed after all attempts"
        );
        Error::RetryExhausted {
            endpoint: self.endpoint.to_string(),
            attempts,
            last_error: self.last_error.map(Box::new),
        }
    }

    fn current_attempt(&self) -> usize {
        match self.state {
            CallState::Pending => 0,
            CallState::Attempting(n)
            | CallState::Retrying(n)
            | CallState::Succeeded(n)
            | CallState::Exhausted(n)
            | CallState::Aborted(n) => n,
        }
    }
}
