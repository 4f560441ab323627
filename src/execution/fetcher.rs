use crate::api::{ApiError, MarketData};
use crate::models::Bar;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Fetches a bounded, time-ordered window of recent minute bars for one
/// symbol.
///
/// The provider is asked for a 2x lookback to absorb missing or partial
/// bars at the venue; the series is then sorted, deduplicated by
/// timestamp and truncated to the most recent `minutes` entries. An
/// empty result is a valid outcome (no data for the symbol).
pub struct BarFetcher {
    data: Arc<dyn MarketData>,
}

impl BarFetcher {
    pub fn new(data: Arc<dyn MarketData>) -> Self {
        Self { data }
    }

    pub async fn fetch(&self, symbol: &str, minutes: usize) -> Result<Vec<Bar>, ApiError> {
        let end = Utc::now();
        let start = end - Duration::minutes(minutes as i64 * 2);

        let mut bars = self.data.get_bars(symbol, start, end).await?;

        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);
        if bars.len() > minutes {
            bars.drain(..bars.len() - minutes);
        }

        tracing::debug!(
            symbol,
            count = bars.len(),
            window_minutes = minutes,
            "fetched bar window"
        );

        Ok(bars)
    }
}
