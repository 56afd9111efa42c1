//! Retry policy wrapped around every request.
//!
//! A [`RetryPolicy`] bounds the number of attempts, chooses the delay
//! between them ([`RetryStrategy`]) and decides which errors are worth
//! another attempt ([`RetryPredicate`]). The default policy runs a unit of
//! work up to [`DEFAULT_MAX_ATTEMPTS`] times, back to back, retrying every
//! error.

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Attempt bound used by every operation unless the client is configured
/// otherwise.
pub const DEFAULT_MAX_ATTEMPTS: usize = 8;

/// Defines how long to wait between attempts.
///
/// # Examples
///
/// ```
/// use teamcity_client::RetryStrategy;
/// use std::time::Duration;
///
/// // Retry straight away
/// let immediate = RetryStrategy::Immediate;
///
/// // 100ms, 200ms, 400ms... capped at 5s
/// let exponential = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
///     jitter: true,
/// };
///
/// // 1s between every attempt
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Retry without waiting.
    #[default]
    Immediate,

    /// Wait the same delay before every retry.
    Linear {
        /// The delay between attempts.
        delay: Duration,
    },

    /// Wait `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
    ExponentialBackoff {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// Whether to scale each delay by a random factor in `[0.5, 1.0]`.
        jitter: bool,
    },

    /// Custom delay function.
    ///
    /// Receives the number of the attempt that just failed (1-indexed) and
    /// returns the delay before the next one, or `None` to stop retrying.
    Custom {
        /// Function that determines retry delay.
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// Returns the delay to wait after the given failed attempt, or `None`
    /// if the strategy gives up.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::Immediate => Some(Duration::ZERO),
            RetryStrategy::Linear { delay } => Some(*delay),
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                jitter,
            } => {
                let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1) as u32);
                let base_delay =
                    initial_delay.saturating_mul(multiplier.try_into().unwrap_or(u32::MAX));
                let delay = base_delay.min(*max_delay);

                if *jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(jitter_factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }
}

/// Decides whether a failed attempt should be retried.
///
/// # Examples
///
/// ```
/// use teamcity_client::{Error, RetryPredicate};
///
/// struct RetryOnBadGateway;
///
/// impl RetryPredicate for RetryOnBadGateway {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         matches!(error.status(), Some(s) if s.as_u16() == 502)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if another attempt should follow the failed
    /// `attempt` (1-indexed).
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry every error, permanent or not.
///
/// This is the default: a 404 or a rejected login costs the same number of
/// round trips as a dropped connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAlways;

impl RetryPredicate for RetryAlways {
    fn should_retry(&self, _error: &Error, _attempt: usize) -> bool {
        true
    }
}

/// Retry only errors for which [`Error::is_retryable`] is `true`.
///
/// Client errors (bad credentials, unknown build), decode failures and
/// missing entities surface after the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry only on 5xx server errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOn5xx;

impl RetryPredicate for RetryOn5xx {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::HttpError { status, .. } if status.is_server_error())
    }
}

/// Retry only when the request never got a response.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnConnectionError;

impl RetryPredicate for RetryOnConnectionError {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(
            error,
            Error::Network(_) | Error::Timeout | Error::Transport(_)
        )
    }
}

/// Combine multiple retry predicates with OR logic.
///
/// # Examples
///
/// ```
/// use teamcity_client::retry::{OrPredicate, RetryOn5xx, RetryOnConnectionError};
///
/// let predicate = OrPredicate::new(vec![
///     Box::new(RetryOn5xx),
///     Box::new(RetryOnConnectionError),
/// ]);
/// ```
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(error, attempt))
    }
}

/// Attempt bound, delay strategy and retry predicate applied to every
/// request a [`Client`](crate::Client) makes.
pub struct RetryPolicy {
    max_attempts: usize,
    strategy: RetryStrategy,
    predicate: Box<dyn RetryPredicate>,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt bound, no delay and
    /// [`RetryAlways`].
    ///
    /// A bound of 0 is treated as 1: the unit of work always runs once.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            strategy: RetryStrategy::Immediate,
            predicate: Box::new(RetryAlways),
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Sets the delay strategy.
    pub fn with_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the retry predicate.
    pub fn with_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// The maximum number of times a unit of work runs.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Runs `unit` until it succeeds, the attempt bound is reached, the
    /// predicate declines or the strategy gives up.
    ///
    /// Every failed attempt is logged. When the loop stops on a failure the
    /// error of the last attempt is returned as is.
    ///
    /// # Examples
    ///
    /// ```
    /// use teamcity_client::{Error, RetryPolicy};
    /// use std::cell::Cell;
    ///
    /// # async fn example() {
    /// let calls = Cell::new(0);
    /// let result = RetryPolicy::default()
    ///     .run(|| {
    ///         calls.set(calls.get() + 1);
    ///         let n = calls.get();
    ///         async move {
    ///             if n < 3 {
    ///                 Err(Error::Timeout)
    ///             } else {
    ///                 Ok(n)
    ///             }
    ///         }
    ///     })
    ///     .await;
    /// assert_eq!(result.unwrap(), 3);
    /// # }
    /// ```
    pub async fn run<T, F, Fut>(&self, mut unit: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match unit().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            tracing::warn!(
                attempt = attempt,
                max_attempts = self.max_attempts,
                error = %error,
                "Request attempt failed"
            );

            if attempt >= self.max_attempts || !self.predicate.should_retry(&error, attempt) {
                return Err(error);
            }

            match self.strategy.delay_for_attempt(attempt) {
                Some(delay) if delay.is_zero() => {}
                Some(delay) => {
                    tracing::info!(
                        delay_ms = delay.as_millis(),
                        attempt = attempt,
                        "Retrying request after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(error),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Runs `unit` under `policy`. Shorthand for [`RetryPolicy::run`].
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, unit: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    policy.run(unit).await
}
