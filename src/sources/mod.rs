use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::types::{NetworkName, Token};

pub mod changelly;
pub mod coingecko;
pub mod jupiter;
pub mod oneinch;
pub mod paraswap;
pub mod rango;

pub use changelly::ChangellySource;
pub use coingecko::CoinGeckoSource;
pub use jupiter::JupiterSource;
pub use oneinch::OneInchSource;
pub use paraswap::ParaswapSource;
pub use rango::RangoClient;

/// Tokens keyed by lowercased address. Values keep the original address
/// casing since base58 networks are case sensitive.
pub type TokenMap = HashMap<String, Token>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status} at {url}: {body}")]
    Api {
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("giving up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },
    #[error("cancelled")]
    Cancelled,
}

/// How the runner treats a failed per-network fetch from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any network failing fails the whole run.
    Abort,
    /// Keep going unless more than half of the attempted networks fail.
    Majority,
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn supported_networks(&self) -> &'static [NetworkName];
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Abort
    }
    async fn fetch_tokens(
        &self,
        network: NetworkName,
        cancel: &CancellationToken,
    ) -> Result<TokenMap, SourceError>;
}

const BACKOFF_MS: [u64; 6] = [100, 500, 1_000, 2_000, 4_000, 8_000];
const JITTER_MS: u64 = 1_000;

/// Bounded retry for a single fetch. Attempts past the backoff schedule keep
/// reusing its last entry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 6 }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    fn delay_before_retry(&self, retry_index: usize) -> Duration {
        let base = BACKOFF_MS[retry_index.min(BACKOFF_MS.len() - 1)];
        let jitter = rand::thread_rng().gen_range(0..JITTER_MS);
        Duration::from_millis(base + jitter)
    }
}

pub fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("swap-tokens-generator/1.0")
        .build()
        .expect("failed to build HTTP client")
}

/// Provider error bodies can be enormous HTML pages. Keep the head and tail
/// halves so failures stay greppable without flooding the log.
pub(crate) fn truncate_body(text: &str) -> String {
    const KEEP: usize = 512;
    if text.len() <= KEEP * 2 {
        return text.to_string();
    }
    let head: String = text.chars().take(KEEP).collect();
    let tail: String = text
        .chars()
        .rev()
        .take(KEEP)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{head}...{tail} (length: {})", text.len())
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<T, SourceError> {
    request_json(client, url, None, policy, cancel).await
}

pub(crate) async fn post_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    body: serde_json::Value,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<T, SourceError> {
    request_json(client, url, Some(body), policy, cancel).await
}

/// One JSON request with the shared retry policy. Transport errors and
/// 5xx/429 statuses are retried; other statuses and undecodable bodies fail
/// immediately. Every wait races the cancellation token.
async fn request_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    body: Option<serde_json::Value>,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<T, SourceError> {
    let mut last_error = String::new();
    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            let delay = policy.delay_before_retry(attempt as usize - 2);
            info!(
                "waiting {}ms before retrying {url} (attempt {attempt}/{})",
                delay.as_millis(),
                policy.max_attempts
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(SourceError::Cancelled),
                _ = sleep(delay) => {}
            }
        }

        let request = match &body {
            Some(json) => client.post(url).json(json),
            None => client.get(url),
        };
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(SourceError::Cancelled),
            res = request.send() => res,
        };

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!("attempt {attempt}/{} for {url} failed: {err}", policy.max_attempts);
                last_error = err.to_string();
                continue;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|err| format!("(unable to read response: {err})"));
            let error = SourceError::Api {
                status,
                url: url.to_string(),
                body: truncate_body(&text),
            };
            if is_retryable_status(status) {
                warn!("attempt {attempt}/{} for {url} failed: {error}", policy.max_attempts);
                last_error = error.to_string();
                continue;
            }
            return Err(error);
        }

        // A body that does not match the expected shape is a schema
        // violation, not a transient fault. Never retried.
        let text = tokio::select! {
            _ = cancel.cancelled() => return Err(SourceError::Cancelled),
            text = response.text() => text,
        };
        let text = match text {
            Ok(text) => text,
            Err(err) => {
                warn!("attempt {attempt}/{} for {url} failed mid-body: {err}", policy.max_attempts);
                last_error = err.to_string();
                continue;
            }
        };
        return serde_json::from_str(&text)
            .map_err(|err| SourceError::InvalidResponse(format!("{err}: {}", truncate_body(&text))));
    }
    Err(SourceError::RetriesExhausted {
        attempts: policy.max_attempts,
        last: last_error,
    })
}

/// Insert tokens under lowercased addresses, last write wins. The same
/// address twice in one provider response is an upstream anomaly worth a
/// warning, never a failure.
pub(crate) fn insert_lowercased(map: &mut TokenMap, source: &str, token: Token) {
    let key = token.address.to_lowercase();
    if let Some(previous) = map.insert(key, token) {
        warn!(
            "{source}: duplicate address {} ({}), keeping the later entry",
            previous.address, previous.symbol
        );
    }
}
