use super::{send_read, ApiError, Broker};
use crate::models::{
    AccountSnapshot, OrderIntent, OrderReceipt, OrderSide, PositionSnapshot, Sizing, TimeInForce,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ALPACA_PAPER_BASE: &str = "https://paper-api.alpaca.markets";

/// Client for the Alpaca trading API (paper endpoint by default):
/// account state, open positions and market order submission.
#[derive(Clone)]
pub struct AlpacaTradingClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

// ============== Wire Types ==============

// Alpaca serializes numeric account/position fields as JSON strings.

#[derive(Debug, Deserialize)]
struct RawAccount {
    equity: String,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    qty: String,
    unrealized_pl: String,
}

#[derive(Debug, Deserialize)]
struct RawOrder {
    id: String,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: &'a str,
    time_in_force: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notional: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    qty: Option<f64>,
}

fn parse_field(raw: &str, field: &str) -> Result<f64, ApiError> {
    raw.parse::<f64>()
        .map_err(|_| ApiError::Parse(format!("non-numeric {}: {:?}", field, raw)))
}

// ============== Implementation ==============

impl AlpacaTradingClient {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            client: Client::new(),
            base_url: ALPACA_PAPER_BASE.to_string(),
            api_key,
            api_secret,
        }
    }

    /// Override the API base URL (tests, live trading endpoint).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
    }
}

#[async_trait]
impl Broker for AlpacaTradingClient {
    /// Endpoint: GET /v2/account
    async fn get_account(&self) -> Result<AccountSnapshot, ApiError> {
        let url = format!("{}/v2/account", self.base_url);
        let response = send_read(|| self.authed(self.client.get(&url))).await?;
        let raw: RawAccount = response.json().await?;

        Ok(AccountSnapshot {
            equity: parse_field(&raw.equity, "equity")?,
        })
    }

    /// Endpoint: GET /v2/positions/{symbol}
    ///
    /// A 404 means no open position for the symbol, which is a valid
    /// state, not a failure.
    async fn get_position(&self, symbol: &str) -> Result<Option<PositionSnapshot>, ApiError> {
        let url = format!("{}/v2/positions/{}", self.base_url, symbol);
        let response = match send_read(|| self.authed(self.client.get(&url))).await {
            Ok(response) => response,
            Err(ApiError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        let raw: RawPosition = response.json().await?;
        Ok(Some(PositionSnapshot {
            qty: parse_field(&raw.qty, "qty")?,
            unrealized_pl: parse_field(&raw.unrealized_pl, "unrealized_pl")?,
        }))
    }

    /// Endpoint: POST /v2/orders
    ///
    /// Submitted exactly once: an ambiguous failure is surfaced rather
    /// than retried, to avoid duplicate orders. Venue rejections
    /// (insufficient funds, untradable symbol, closed market) come back
    /// as `ApiError::Status`.
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, ApiError> {
        let (notional, qty) = match intent.sizing {
            Sizing::Notional(n) => (Some(n), None),
            Sizing::Quantity(q) => (None, Some(q)),
        };
        let body = OrderRequest {
            symbol: &intent.symbol,
            side: intent.side,
            order_type: "market",
            time_in_force: match intent.time_in_force {
                TimeInForce::Day => "day",
            },
            notional,
            qty,
        };

        let url = format!("{}/v2/orders", self.base_url);
        let response = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let raw: RawOrder = response.json().await?;
        Ok(OrderReceipt { id: raw.id })
    }
}
