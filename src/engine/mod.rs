// Cycle orchestration module

use crate::api::{ApiError, Broker, MarketData};
use crate::config::Config;
use crate::execution::{BarFetcher, OrderExecutor};
use crate::indicators::IndicatorFrame;
use crate::metrics::MetricsSink;
use crate::models::{CycleReport, Outcome, Signal, SymbolReport};
use crate::risk::notional_size;
use crate::strategy::RsiEmaStrategy;
use std::sync::Arc;
use tokio::time::{timeout, timeout_at, Instant};

/// Runs the signal-evaluation and order-execution pipeline over the
/// configured symbol set, once per invocation.
///
/// Symbols are fully independent: each runs as its own task under a
/// per-symbol timeout, with a run-level deadline over the whole cycle.
/// A failure in one symbol's pipeline is captured into that symbol's
/// result slot and never aborts the siblings.
pub struct Engine {
    data: Arc<dyn MarketData>,
    broker: Arc<dyn Broker>,
    metrics: Arc<dyn MetricsSink>,
    strategy: RsiEmaStrategy,
    config: Config,
}

impl Engine {
    pub fn new(
        data: Arc<dyn MarketData>,
        broker: Arc<dyn Broker>,
        metrics: Arc<dyn MetricsSink>,
        config: Config,
    ) -> Self {
        Self {
            data,
            broker,
            metrics,
            strategy: RsiEmaStrategy::default(),
            config,
        }
    }

    pub fn with_strategy(mut self, strategy: RsiEmaStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Evaluate every configured symbol and assemble the cycle report.
    /// The report always carries one record per input symbol, in input
    /// order, and never propagates an error past this boundary.
    pub async fn run_cycle(&self) -> CycleReport {
        let symbols: Vec<String> = self
            .config
            .symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .collect();

        // Equity is read once per cycle and shared across symbols
        let equity = match self.broker.get_account().await {
            Ok(account) => account.equity,
            Err(e) => {
                tracing::error!(error = %e, "account read failed, no symbol can be evaluated");
                let results = symbols
                    .into_iter()
                    .map(|symbol| SymbolReport {
                        symbol,
                        outcome: Outcome::Error {
                            error: format!("account read failed: {}", e),
                        },
                    })
                    .collect();
                return CycleReport::new(results);
            }
        };
        self.metrics.publish("Equity", equity, Some("Portfolio"));
        tracing::info!(equity, symbol_count = symbols.len(), "starting cycle");

        let deadline = Instant::now() + self.config.cycle_deadline;

        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let symbol = symbol.clone();
                let fetcher = BarFetcher::new(self.data.clone());
                let executor = OrderExecutor::new(self.broker.clone(), self.metrics.clone());
                let metrics = self.metrics.clone();
                let strategy = self.strategy;
                let risk_fraction = self.config.risk_fraction;
                let minutes = self.config.minutes_history;
                let per_symbol = self.config.symbol_timeout;

                tokio::spawn(async move {
                    let evaluation = evaluate_symbol(
                        &symbol,
                        equity,
                        &fetcher,
                        &executor,
                        metrics.as_ref(),
                        strategy,
                        risk_fraction,
                        minutes,
                    );
                    match timeout(per_symbol, evaluation).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            tracing::error!(
                                symbol = %symbol,
                                "symbol evaluation timed out after {:?}",
                                per_symbol
                            );
                            Outcome::Error {
                                error: format!("evaluation timed out after {:?}", per_symbol),
                            }
                        }
                    }
                })
            })
            .collect();

        let mut results = Vec::with_capacity(symbols.len());
        for (symbol, mut handle) in symbols.into_iter().zip(handles) {
            let outcome = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join_err)) => {
                    tracing::error!(symbol = %symbol, error = %join_err, "symbol task failed");
                    Outcome::Error {
                        error: format!("task failed: {}", join_err),
                    }
                }
                Err(_) => {
                    handle.abort();
                    tracing::error!(
                        symbol = %symbol,
                        "cycle deadline expired, abandoning in-flight evaluation"
                    );
                    Outcome::Error {
                        error: "cycle deadline expired".to_string(),
                    }
                }
            };
            results.push(SymbolReport { symbol, outcome });
        }

        CycleReport::new(results)
    }
}

/// One symbol's pipeline with its error boundary: any failure is
/// captured here as an error outcome for this symbol's slot.
#[allow(clippy::too_many_arguments)]
async fn evaluate_symbol(
    symbol: &str,
    equity: f64,
    fetcher: &BarFetcher,
    executor: &OrderExecutor,
    metrics: &dyn MetricsSink,
    strategy: RsiEmaStrategy,
    risk_fraction: f64,
    minutes: usize,
) -> Outcome {
    let pipeline = run_pipeline(
        symbol,
        equity,
        fetcher,
        executor,
        metrics,
        strategy,
        risk_fraction,
        minutes,
    );
    match pipeline.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(symbol = %symbol, error = %e, "symbol evaluation failed");
            Outcome::Error {
                error: e.to_string(),
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    symbol: &str,
    equity: f64,
    fetcher: &BarFetcher,
    executor: &OrderExecutor,
    metrics: &dyn MetricsSink,
    strategy: RsiEmaStrategy,
    risk_fraction: f64,
    minutes: usize,
) -> Result<Outcome, ApiError> {
    let bars = fetcher.fetch(symbol, minutes).await?;
    if bars.is_empty() {
        tracing::info!(symbol = %symbol, "no market data in window");
        return Ok(Outcome::NoData);
    }

    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let frame = IndicatorFrame::compute(&closes);
    let signal = strategy.evaluate(&frame);

    if let Signal::Buy(snap) | Signal::Sell(snap) | Signal::NoSignal(snap) = signal {
        tracing::info!(
            symbol = %symbol,
            close = snap.close,
            rsi = snap.rsi,
            ema = snap.ema,
            "latest indicator row"
        );
        metrics.publish("RSI", snap.rsi, Some(symbol));
        metrics.publish("EMA9", snap.ema, Some(symbol));
        metrics.publish("Price", snap.close, Some(symbol));
    }

    match signal {
        Signal::NoData => Ok(Outcome::NoData),
        Signal::InsufficientData => {
            tracing::info!(symbol = %symbol, bars = bars.len(), "too few bars for indicators");
            Ok(Outcome::InsufficientData)
        }
        Signal::Buy(_) => {
            let notional = notional_size(equity, risk_fraction);
            tracing::info!(symbol = %symbol, notional, equity, "buy signal");
            executor.execute_buy(symbol, notional).await
        }
        Signal::Sell(_) => executor.execute_sell(symbol).await,
        Signal::NoSignal(snap) => Ok(Outcome::NoSignal {
            close: snap.close,
            rsi: snap.rsi,
            ema: snap.ema,
        }),
    }
}
