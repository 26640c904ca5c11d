//! LLM API interaction with exponential backoff retry logic.
//!
//! The rendered digest is handed to an OpenAI-compatible endpoint through
//! `awful_aj`, using a named chat template that carries the instructions.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`AskFnWrapper`]: Wraps the `awful_aj` library's `ask` function
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Source fetches are never retried; only the single model call per run is.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Trait for async LLM interaction.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        self.base_delay.saturating_mul(1 << shift).min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.delay_for(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    /// LLM configuration (API keys, endpoints, model settings).
    pub config: &'a AwfulJadeConfig,
    /// Chat template holding the brief-writing instructions.
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        let dt = t0.elapsed();

        if let Err(e) = &res {
            warn!(elapsed_ms = dt.as_millis(), error = %e, "API call failed");
        }
        res
    }
}

/// The user message sent alongside the template: the run date, then the digest.
pub fn compose_request(date: &str, digest: &str) -> String {
    format!("Date: {date}\n\n{digest}")
}

/// Ask `api` to write the brief for `digest`.
#[instrument(level = "info", skip_all, fields(date = %date))]
pub async fn generate_brief<A>(api: &A, date: &str, digest: &str) -> Result<String, Box<dyn Error>>
where
    A: AskAsync<Response = String>,
{
    let t0 = Instant::now();
    let res = api.ask(&compose_request(date, digest)).await;
    let dt = t0.elapsed();

    match &res {
        Ok(text) => info!(
            elapsed_ms_total = dt.as_millis(),
            bytes = text.len(),
            "Brief generated"
        ),
        Err(e) => error!(elapsed_ms_total = dt.as_millis(), error = %e, "Brief generation failed"),
    }
    res
}

/// Call the configured LLM with exponential backoff: up to 5 retries,
/// 1s, 2s, 4s, 8s, 16s (capped at 30s) plus jitter.
pub async fn ask_with_backoff(
    config: &AwfulJadeConfig,
    template: &ChatTemplate,
    date: &str,
    digest: &str,
) -> Result<String, Box<dyn Error>> {
    let client = AskFnWrapper { config, template };
    let api = RetryAsk::new(client, 5, StdDuration::from_secs(1));
    generate_brief(&api, date, digest).await
}
