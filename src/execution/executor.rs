use std::sync::Arc;

use crate::api::{ApiError, Broker};
use crate::metrics::MetricsSink;
use crate::models::{OrderIntent, Outcome};

/// Submits market orders to the brokerage and reports the outcome.
///
/// A sell attempt against a symbol with no open position resolves to
/// `Outcome::NothingToSell`, a first-class terminal state rather than an
/// error. Venue rejections propagate as `ApiError`.
pub struct OrderExecutor {
    broker: Arc<dyn Broker>,
    metrics: Arc<dyn MetricsSink>,
}

impl OrderExecutor {
    pub fn new(broker: Arc<dyn Broker>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { broker, metrics }
    }

    /// Submit a notional-sized market buy, good for the current session.
    pub async fn execute_buy(&self, symbol: &str, notional: f64) -> Result<Outcome, ApiError> {
        let intent = OrderIntent::market_buy_notional(symbol, notional);
        let receipt = self.broker.submit_order(&intent).await?;

        tracing::info!(
            symbol,
            order_id = %receipt.id,
            notional,
            "submitted buy order"
        );
        self.metrics.publish("TradeNotional", notional, Some(symbol));
        self.metrics.publish("BuySignal", 1.0, Some(symbol));

        Ok(Outcome::Buy {
            order_id: receipt.id,
            notional,
        })
    }

    /// Exit the full held quantity with a market sell, if a position is
    /// open; otherwise report there was nothing to sell.
    pub async fn execute_sell(&self, symbol: &str) -> Result<Outcome, ApiError> {
        let Some(position) = self.broker.get_position(symbol).await? else {
            tracing::info!(symbol, "no open position, nothing to sell");
            return Ok(Outcome::NothingToSell);
        };

        self.metrics
            .publish("TradeQuantity", position.qty, Some(symbol));
        self.metrics
            .publish("PnL", position.unrealized_pl, Some(symbol));

        let intent = OrderIntent::market_sell_qty(symbol, position.qty);
        let receipt = self.broker.submit_order(&intent).await?;

        tracing::info!(
            symbol,
            order_id = %receipt.id,
            qty = position.qty,
            unrealized_pl = position.unrealized_pl,
            "submitted sell order for full position"
        );
        self.metrics.publish("SellSignal", 1.0, Some(symbol));

        Ok(Outcome::Sell {
            order_id: receipt.id,
            qty: position.qty,
        })
    }
}
