//! Retry policies with exponential backoff
//!
//! Transport-level retry for content-management API calls. The import core never
//! retries on its own; only `CmaClient` wraps its requests in a `RetryPolicy`.

use log::{debug, info, warn};
use rand::Rng;
use reqwest::Method;
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom attempt budget
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }
}

/// Types of errors and their retry behavior
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Connection could not be established (DNS, refused, etc)
    Network,
    /// Connection dropped after the request may have been written
    Interrupted,
    /// HTTP 5xx server errors
    ServerError(u16),
    /// HTTP 429 Too Many Requests
    RateLimited,
    /// HTTP 408 Request Timeout
    Timeout,
    /// Non-retryable client errors (4xx except 408, 429)
    ClientError(u16),
    /// Unknown/other errors
    Unknown,
}

impl RetryableError {
    /// Determine if this error type should be retried
    pub fn should_retry(&self) -> bool {
        match self {
            RetryableError::Network => true,
            RetryableError::Interrupted => true,
            RetryableError::ServerError(_) => true,
            RetryableError::RateLimited => true,
            RetryableError::Timeout => true,
            RetryableError::ClientError(_) => false,
            RetryableError::Unknown => false,
        }
    }

    /// Retry decision for a request whose method may not be idempotent.
    ///
    /// A POST that timed out or hit a 5xx may already have been applied, and
    /// sending it again with the same client-generated id fails as a
    /// duplicate. Only failures that guarantee the server did nothing are
    /// retried for such requests.
    pub fn should_retry_request(&self, idempotent: bool) -> bool {
        if idempotent {
            self.should_retry()
        } else {
            matches!(self, RetryableError::Network | RetryableError::RateLimited)
        }
    }

    /// Classify an HTTP status code into retry behavior
    pub fn from_status_code(status: u16) -> Self {
        match status {
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    /// Classify a reqwest error
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() {
            RetryableError::Network
        } else if error.is_request() {
            RetryableError::Interrupted
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }
}

/// Retry policy that implements exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Send a request with retry logic.
    ///
    /// Transport errors and retryable statuses (408, 429, 5xx) are retried until
    /// the attempt budget runs out. Non-idempotent methods are only retried on
    /// connection failures and 429. The last response is returned as-is, so the
    /// caller still decides what a non-success status means.
    pub async fn send<F, Fut>(&self, method: &Method, request: F) -> anyhow::Result<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let idempotent = method.is_idempotent();
        let mut attempt = 1;

        loop {
            debug!("Sending request (attempt {}/{})", attempt, max_attempts);

            match request().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry = !response.status().is_success()
                        && RetryableError::from_status_code(status).should_retry_request(idempotent);
                    if !retry || attempt == max_attempts {
                        if attempt > 1 && response.status().is_success() {
                            info!("Request succeeded after {} attempts", attempt);
                        }
                        return Ok(response);
                    }
                    warn!("Request returned {} on attempt {} (retryable)", status, attempt);
                }
                Err(error) => {
                    let retry = RetryableError::from_reqwest_error(&error).should_retry_request(idempotent);
                    if !retry || attempt == max_attempts {
                        warn!(
                            "Request failed permanently on attempt {} (should_retry: {}): {}",
                            attempt, retry, error
                        );
                        return Err(error.into());
                    }
                    warn!("Request failed on attempt {} (retryable): {}", attempt, error);
                }
            }

            let delay = self.calculate_delay(attempt);
            debug!("Waiting {:?} before retry", delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Calculate exponential backoff delay with optional jitter
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64);

        if delay > self.config.max_delay {
            delay = self.config.max_delay;
        }

        if self.config.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.5);
            let jittered_ms = (delay.as_millis() as f64 * jitter_factor) as u64;
            delay = Duration::from_millis(jittered_ms);
        }

        delay
    }
}
