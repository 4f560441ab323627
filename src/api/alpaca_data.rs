use super::{send_read, ApiError, MarketData};
use crate::models::Bar;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;

const ALPACA_DATA_BASE: &str = "https://data.alpaca.markets";

/// Maximum bars per request; generously above any sane lookback window.
const BAR_LIMIT: usize = 10_000;

/// Client for the Alpaca historical market-data API (minute bars).
#[derive(Clone)]
pub struct AlpacaDataClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct BarsResponse {
    /// Absent or null when the venue has no data for the window.
    #[serde(default)]
    bars: Option<Vec<RawBar>>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "t")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "c")]
    close: f64,
}

// ============== Implementation ==============

impl AlpacaDataClient {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            client: Client::new(),
            base_url: ALPACA_DATA_BASE.to_string(),
            api_key,
            api_secret,
        }
    }

    /// Override the API base URL (tests, alternative environments).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl MarketData for AlpacaDataClient {
    /// Get 1-minute bars for `symbol` between `start` and `end`.
    /// Endpoint: GET /v2/stocks/{symbol}/bars?timeframe=1Min
    ///
    /// No data in the window yields an empty series, not an error.
    async fn get_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ApiError> {
        let url = format!("{}/v2/stocks/{}/bars", self.base_url, symbol);

        let response = send_read(|| {
            self.client
                .get(&url)
                .header("APCA-API-KEY-ID", &self.api_key)
                .header("APCA-API-SECRET-KEY", &self.api_secret)
                .query(&[
                    ("timeframe", "1Min".to_string()),
                    ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("limit", BAR_LIMIT.to_string()),
                ])
        })
        .await?;

        let data: BarsResponse = response.json().await?;

        let bars = data
            .bars
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Bar {
                timestamp: raw.timestamp,
                close: raw.close,
            })
            .collect();

        Ok(bars)
    }
}
