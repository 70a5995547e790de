// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry utilities with exponential backoff for icon fetches.
///
/// The policy is a pure function of the attempt number and the class of the
/// last failure, kept apart from the async executor so that it can be tested
/// without any network doubles.
use std::{fmt::Display, time::Duration};

use tokio::time::sleep;
use tracing::{debug, warn};

/// Broad category of a failed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub enum ErrorClass
{
    /// The attempt exceeded its deadline (also HTTP 408).
    Timeout,
    /// The server asked the client to slow down (HTTP 429).
    RateLimited,
    /// The server failed (HTTP 5xx).
    Server,
    /// The connection could not be established or was interrupted.
    Transport,
    /// The request itself was rejected (HTTP 4xx other than 408/429).
    Client,
    /// The request could not be built or the payload could not be decoded.
    Parse,
}

impl ErrorClass
{
    /// Classifies a non-success HTTP status code.
    pub fn from_status(status: u16,) -> Self
    {
        match status {
            408 => Self::Timeout,
            429 => Self::RateLimited,
            400..=499 => Self::Client,
            500..=599 => Self::Server,
            _ => Self::Transport,
        }
    }

    /// Returns `true` when another attempt may succeed.
    pub fn is_retryable(self,) -> bool
    {
        !matches!(self, Self::Client | Self::Parse)
    }

    /// Timeouts and rate limiting back off harder than other failures.
    fn is_slow(self,) -> bool
    {
        matches!(self, Self::Timeout | Self::RateLimited)
    }
}

/// Implemented by error types that can be fed into the retry policy.
pub trait Classify
{
    /// Returns the class of this failure.
    fn class(&self,) -> ErrorClass;
}

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, PartialEq,)]
pub struct RetryConfig
{
    /// Retries allowed after the first attempt (default: 3).
    pub max_retries:        u32,
    /// Delay before the first retry in milliseconds (default: 300).
    pub initial_delay_ms:   u64,
    /// Multiplier for exponential backoff (default: 2.0).
    pub backoff_factor:     f64,
    /// Upper bound for the exponential part of the delay (default: 5000).
    pub max_delay_ms:       u64,
    /// Extra multiplier applied to timeout and rate-limit failures
    /// (default: 3.0).
    pub slow_error_factor:  f64,
    /// Deadline for a single attempt in milliseconds (default: 10000).
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig
{
    fn default() -> Self
    {
        Self {
            max_retries:        3,
            initial_delay_ms:   300,
            backoff_factor:     2.0,
            max_delay_ms:       5_000,
            slow_error_factor:  3.0,
            attempt_timeout_ms: 10_000,
        }
    }
}

/// Outcome of consulting the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum RetryDecision
{
    /// Wait for `delay` and try again.
    Retry
    {
        /// Time to wait before the next attempt.
        delay: Duration,
    },
    /// Stop and report the failure.
    GiveUp,
}

impl RetryConfig
{
    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self,) -> u32
    {
        self.max_retries.saturating_add(1,)
    }

    /// Deadline applied to each individual attempt.
    pub fn attempt_timeout(&self,) -> Duration
    {
        Duration::from_millis(self.attempt_timeout_ms,)
    }

    /// Decides what to do after `attempt` (1-based) failed with `class`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use pine_icons::{ErrorClass, RetryConfig, RetryDecision};
    ///
    /// let config = RetryConfig::default();
    /// assert_eq!(
    ///     config.decide(1, ErrorClass::Server,),
    ///     RetryDecision::Retry {
    ///         delay: Duration::from_millis(300,),
    ///     }
    /// );
    /// assert_eq!(config.decide(1, ErrorClass::Client,), RetryDecision::GiveUp);
    /// assert_eq!(config.decide(4, ErrorClass::Server,), RetryDecision::GiveUp);
    /// ```
    pub fn decide(&self, attempt: u32, class: ErrorClass,) -> RetryDecision
    {
        if !class.is_retryable() || attempt == 0 || attempt > self.max_retries {
            return RetryDecision::GiveUp;
        }

        let exponent = i32::try_from(attempt - 1,).unwrap_or(i32::MAX,);
        let scaled = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent,);
        let mut delay_ms = scaled.min(self.max_delay_ms as f64,);
        if class.is_slow() {
            delay_ms *= self.slow_error_factor;
        }

        RetryDecision::Retry {
            delay: Duration::from_millis(delay_ms.max(0.0,) as u64,),
        }
    }
}

/// Executes an async operation, retrying failures the policy allows.
///
/// # Arguments
///
/// * `config` - Retry configuration (bounds, delays)
/// * `operation_name` - Name of the operation for logging
/// * `f` - Async function to retry
///
/// # Errors
///
/// Returns the last error once the policy gives up, either because the
/// failure is terminal or because the retry budget is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E,>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, E,>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E,>,>,
    E: Classify + Display,
{
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result,) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result,);
            }
            Err(error,) => match config.decide(attempt, error.class(),) {
                RetryDecision::GiveUp => {
                    warn!("{} failed after {} attempt(s): {}", operation_name, attempt, error);
                    return Err(error,);
                }
                RetryDecision::Retry {
                    delay,
                } => {
                    warn!(
                        "{} failed on attempt {}/{}: {}. Retrying in {}ms...",
                        operation_name,
                        attempt,
                        config.max_attempts(),
                        error,
                        delay.as_millis()
                    );
                    sleep(delay,).await;
                    attempt += 1;
                }
            },
        }
    }
}
