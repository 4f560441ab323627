use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One minute bar for a symbol: UTC timestamp and closing price.
///
/// A fetched series is always sorted ascending by timestamp with no
/// duplicate timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// The latest fully-defined indicator row backing a trade decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: f64,
    pub ema: f64,
}

/// Trading signal for one symbol, evaluated fresh each cycle.
///
/// `NoData` and `InsufficientData` are normal outcomes, not errors:
/// the venue had no bars, or too few to define both indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Buy(IndicatorSnapshot),
    Sell(IndicatorSnapshot),
    NoSignal(IndicatorSnapshot),
    NoData,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// How an order is sized: by dollar amount (fractional shares) or by
/// an exact share quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    Notional(f64),
    Quantity(f64),
}

/// All orders are good for the current trading session only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeInForce {
    Day,
}

/// A market order ready for submission to the brokerage.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub sizing: Sizing,
    pub time_in_force: TimeInForce,
}

impl OrderIntent {
    pub fn market_buy_notional(symbol: &str, notional: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            sizing: Sizing::Notional(notional),
            time_in_force: TimeInForce::Day,
        }
    }

    pub fn market_sell_qty(symbol: &str, qty: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            sizing: Sizing::Quantity(qty),
            time_in_force: TimeInForce::Day,
        }
    }
}

/// Broker acknowledgement of a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub id: String,
}

/// Account state read fresh from the brokerage each cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub equity: f64,
}

/// An open position for a symbol. Absence of one is a valid state,
/// modeled as `Option<PositionSnapshot>` at the broker seam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot {
    pub qty: f64,
    pub unrealized_pl: f64,
}

/// Per-symbol result of one pipeline run, serialized under an `action` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outcome {
    Buy { order_id: String, notional: f64 },
    Sell { order_id: String, qty: f64 },
    NothingToSell,
    NoSignal { close: f64, rsi: f64, ema: f64 },
    NoData,
    InsufficientData,
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Aggregate result of one cycle. `status_code` is always 200: every
/// failure is captured into a per-symbol record, never raised past
/// the invocation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub status_code: u16,
    pub results: Vec<SymbolReport>,
}

impl CycleReport {
    pub fn new(results: Vec<SymbolReport>) -> Self {
        Self {
            status_code: 200,
            results,
        }
    }
}
