pub mod alpaca_data;
pub mod alpaca_trading;
pub mod secrets;

pub use alpaca_data::AlpacaDataClient;
pub use alpaca_trading::AlpacaTradingClient;
pub use secrets::{EnvSecretStore, SecretStore};

use crate::models::{AccountSnapshot, Bar, OrderIntent, OrderReceipt, PositionSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

const MAX_READ_RETRIES: u32 = 3;

/// Error from the market-data or brokerage API.
///
/// `NotFound` is split out so callers can treat a missing resource
/// (e.g. no open position for a symbol) as a checked state instead of a
/// generic failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("resource not found")]
    NotFound,
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Historical market-data provider: a bounded window of minute bars.
/// Returning an empty series for a symbol is valid, not an error.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn get_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ApiError>;
}

/// Brokerage/execution venue: account state, position lookup and market
/// order submission. `get_position` returns `Ok(None)` when no position
/// is open for the symbol.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn get_account(&self) -> Result<AccountSnapshot, ApiError>;

    async fn get_position(&self, symbol: &str) -> Result<Option<PositionSnapshot>, ApiError>;

    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, ApiError>;
}

/// Send an idempotent read, retrying transient failures (network errors,
/// 429, 5xx) with exponential backoff. Never used for order submission:
/// resubmitting an order after an ambiguous failure risks duplicates.
pub(crate) async fn send_read<F>(build: F) -> Result<reqwest::Response, ApiError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 1;
    loop {
        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let transient = status.is_server_error() || status.as_u16() == 429;
                if transient && attempt < MAX_READ_RETRIES {
                    let backoff = std::time::Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        %status,
                        attempt,
                        "transient api error, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ApiError::NotFound);
                }

                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status { status, body });
            }
            Err(e) if attempt < MAX_READ_RETRIES => {
                let backoff = std::time::Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    error = %e,
                    attempt,
                    "network error, retrying in {:?}",
                    backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(ApiError::Http(e)),
        }
    }
}
