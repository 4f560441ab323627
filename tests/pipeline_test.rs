use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use equibot::api::{ApiError, Broker, MarketData};
use equibot::metrics::MetricsSink;
use equibot::{
    AccountSnapshot, Bar, Config, Engine, OrderIntent, OrderReceipt, Outcome, PositionSnapshot,
    Sizing,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============== Fakes ==============

#[derive(Default)]
struct FakeMarketData {
    closes_by_symbol: HashMap<String, Vec<f64>>,
    failing_symbols: Vec<String>,
    delay: Option<Duration>,
}

impl FakeMarketData {
    fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.closes_by_symbol.insert(symbol.to_string(), closes);
        self
    }

    fn failing_on(mut self, symbol: &str) -> Self {
        self.failing_symbols.push(symbol.to_string());
        self
    }
}

#[async_trait]
impl MarketData for FakeMarketData {
    async fn get_bars(
        &self,
        symbol: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, ApiError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_symbols.iter().any(|s| s == symbol) {
            return Err(ApiError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "data provider unavailable".to_string(),
            });
        }

        let closes = self.closes_by_symbol.get(symbol).cloned().unwrap_or_default();
        let base = Utc::now() - ChronoDuration::minutes(closes.len() as i64);
        Ok(closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| Bar {
                timestamp: base + ChronoDuration::minutes(i as i64),
                close,
            })
            .collect())
    }
}

struct FakeBroker {
    equity: f64,
    fail_account: bool,
    positions: HashMap<String, PositionSnapshot>,
    orders: Mutex<Vec<OrderIntent>>,
    next_order: AtomicUsize,
}

impl FakeBroker {
    fn new(equity: f64) -> Self {
        Self {
            equity,
            fail_account: false,
            positions: HashMap::new(),
            orders: Mutex::new(Vec::new()),
            next_order: AtomicUsize::new(1),
        }
    }

    fn with_position(mut self, symbol: &str, qty: f64, unrealized_pl: f64) -> Self {
        self.positions
            .insert(symbol.to_string(), PositionSnapshot { qty, unrealized_pl });
        self
    }
}

#[async_trait]
impl Broker for FakeBroker {
    async fn get_account(&self) -> Result<AccountSnapshot, ApiError> {
        if self.fail_account {
            return Err(ApiError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "brokerage maintenance".to_string(),
            });
        }
        Ok(AccountSnapshot {
            equity: self.equity,
        })
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<PositionSnapshot>, ApiError> {
        Ok(self.positions.get(symbol).copied())
    }

    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderReceipt, ApiError> {
        self.orders.lock().unwrap().push(intent.clone());
        let n = self.next_order.fetch_add(1, Ordering::SeqCst);
        Ok(OrderReceipt {
            id: format!("order-{}", n),
        })
    }
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<(String, f64, Option<String>)>>);

impl RecordingSink {
    fn recorded(&self) -> Vec<(String, f64, Option<String>)> {
        self.0.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    fn publish(&self, name: &str, value: f64, symbol: Option<&str>) {
        self.0
            .lock()
            .unwrap()
            .push((name.to_string(), value, symbol.map(String::from)));
    }
}

// ============== Helpers ==============

fn test_config(symbols: &[&str]) -> Config {
    Config::from_lookup(|key| match key {
        "SYMBOLS" => Some(symbols.join(",")),
        "RISK_PCT" => Some("0.02".to_string()),
        "MINUTES_HISTORY" => Some("60".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Flat at 10 long enough to define both indicators, then three drops
/// to 8: RSI collapses to 0 while the EMA stays elevated above the
/// close, which is the buy setup.
fn flat_then_drop() -> Vec<f64> {
    let mut closes = vec![10.0; 30];
    closes.extend_from_slice(&[8.0, 8.0, 8.0]);
    closes
}

/// Flat then three +2 rises: every change is a gain, so RSI reads 100
/// while the close runs above the lagging EMA, which is the sell setup.
fn flat_then_rise() -> Vec<f64> {
    let mut closes = vec![10.0; 30];
    closes.extend_from_slice(&[12.0, 14.0, 16.0]);
    closes
}

// ============== Scenarios ==============

#[tokio::test]
async fn buy_signal_submits_notional_order_sized_from_equity() {
    let data = Arc::new(FakeMarketData::default().with_closes("AAPL", flat_then_drop()));
    let broker = Arc::new(FakeBroker::new(100_000.0));
    let metrics = Arc::new(RecordingSink::default());

    let engine = Engine::new(
        data,
        broker.clone(),
        metrics.clone(),
        test_config(&["AAPL"]),
    );
    let report = engine.run_cycle().await;

    assert_eq!(report.status_code, 200);
    assert_eq!(report.results.len(), 1);
    match &report.results[0].outcome {
        Outcome::Buy { notional, .. } => assert_eq!(*notional, 100_000.0 * 0.02),
        other => panic!("expected buy, got {other:?}"),
    }

    let orders = broker.orders.lock().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].sizing, Sizing::Notional(2000.0));

    // Portfolio equity published once, before per-symbol work
    let recorded = metrics.recorded();
    assert_eq!(
        recorded[0],
        ("Equity".to_string(), 100_000.0, Some("Portfolio".to_string()))
    );
    assert!(recorded.iter().any(|m| m.0 == "BuySignal"));
}

#[tokio::test]
async fn sell_signal_without_position_is_nothing_to_sell() {
    let data = Arc::new(FakeMarketData::default().with_closes("AAPL", flat_then_rise()));
    let broker = Arc::new(FakeBroker::new(100_000.0));

    let engine = Engine::new(
        data,
        broker.clone(),
        Arc::new(RecordingSink::default()),
        test_config(&["AAPL"]),
    );
    let report = engine.run_cycle().await;

    assert_eq!(report.results[0].outcome, Outcome::NothingToSell);
    assert!(broker.orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sell_signal_exits_full_position() {
    let data = Arc::new(FakeMarketData::default().with_closes("AAPL", flat_then_rise()));
    let broker = Arc::new(FakeBroker::new(100_000.0).with_position("AAPL", 12.5, 84.0));
    let metrics = Arc::new(RecordingSink::default());

    let engine = Engine::new(
        data,
        broker.clone(),
        metrics.clone(),
        test_config(&["AAPL"]),
    );
    let report = engine.run_cycle().await;

    match &report.results[0].outcome {
        Outcome::Sell { qty, .. } => assert_eq!(*qty, 12.5),
        other => panic!("expected sell, got {other:?}"),
    }

    let orders = broker.orders.lock().unwrap();
    assert_eq!(orders[0].sizing, Sizing::Quantity(12.5));

    let recorded = metrics.recorded();
    assert!(recorded
        .iter()
        .any(|m| m.0 == "PnL" && m.1 == 84.0 && m.2.as_deref() == Some("AAPL")));
    assert!(recorded.iter().any(|m| m.0 == "TradeQuantity" && m.1 == 12.5));
}

#[tokio::test]
async fn failure_in_one_symbol_does_not_abort_siblings() {
    let data = Arc::new(
        FakeMarketData::default()
            .with_closes("AAPL", flat_then_drop())
            .failing_on("MSFT")
            .with_closes("TSLA", vec![10.0; 33]),
    );
    let broker = Arc::new(FakeBroker::new(100_000.0));

    let engine = Engine::new(
        data,
        broker,
        Arc::new(RecordingSink::default()),
        test_config(&["AAPL", "MSFT", "TSLA"]),
    );
    let report = engine.run_cycle().await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[0].symbol, "AAPL");
    assert_eq!(report.results[1].symbol, "MSFT");
    assert_eq!(report.results[2].symbol, "TSLA");

    assert!(matches!(report.results[0].outcome, Outcome::Buy { .. }));
    match &report.results[1].outcome {
        Outcome::Error { error } => assert!(error.contains("data provider unavailable")),
        other => panic!("expected error, got {other:?}"),
    }
    // Flat series: neutral RSI, close on the EMA
    assert!(matches!(
        report.results[2].outcome,
        Outcome::NoSignal { .. }
    ));
}

#[tokio::test]
async fn missing_and_short_data_are_normal_outcomes() {
    let data = Arc::new(
        FakeMarketData::default()
            // NONE: no closes registered at all
            .with_closes("FEW", vec![10.0; 12]),
    );
    let broker = Arc::new(FakeBroker::new(100_000.0));

    let engine = Engine::new(
        data,
        broker,
        Arc::new(RecordingSink::default()),
        test_config(&["NONE", "FEW"]),
    );
    let report = engine.run_cycle().await;

    assert_eq!(report.results[0].outcome, Outcome::NoData);
    assert_eq!(report.results[1].outcome, Outcome::InsufficientData);
}

#[tokio::test]
async fn symbols_are_normalized_before_evaluation() {
    let data = Arc::new(FakeMarketData::default().with_closes("AAPL", flat_then_drop()));
    let broker = Arc::new(FakeBroker::new(100_000.0));

    let engine = Engine::new(
        data,
        broker,
        Arc::new(RecordingSink::default()),
        test_config(&[" aapl "]),
    );
    let report = engine.run_cycle().await;

    assert_eq!(report.results[0].symbol, "AAPL");
    assert!(matches!(report.results[0].outcome, Outcome::Buy { .. }));
}

#[tokio::test]
async fn account_read_failure_marks_every_symbol() {
    let data = Arc::new(FakeMarketData::default());
    let mut broker = FakeBroker::new(100_000.0);
    broker.fail_account = true;

    let engine = Engine::new(
        data,
        Arc::new(broker),
        Arc::new(RecordingSink::default()),
        test_config(&["AAPL", "MSFT"]),
    );
    let report = engine.run_cycle().await;

    assert_eq!(report.status_code, 200);
    assert_eq!(report.results.len(), 2);
    for result in &report.results {
        match &result.outcome {
            Outcome::Error { error } => assert!(error.contains("account read failed")),
            other => panic!("expected error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn slow_symbol_times_out_without_blocking_others() {
    let slow = FakeMarketData {
        closes_by_symbol: HashMap::new(),
        failing_symbols: Vec::new(),
        delay: Some(Duration::from_secs(60)),
    };
    let data = Arc::new(slow);
    let broker = Arc::new(FakeBroker::new(100_000.0));

    let config = Config::from_lookup(|key| match key {
        "SYMBOLS" => Some("SLOW".to_string()),
        "RISK_PCT" => Some("0.02".to_string()),
        "MINUTES_HISTORY" => Some("60".to_string()),
        "SYMBOL_TIMEOUT_SECS" => Some("1".to_string()),
        "CYCLE_DEADLINE_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();

    let engine = Engine::new(data, broker, Arc::new(RecordingSink::default()), config);

    let started = std::time::Instant::now();
    let report = engine.run_cycle().await;
    assert!(started.elapsed() < Duration::from_secs(5));

    match &report.results[0].outcome {
        Outcome::Error { error } => assert!(error.contains("timed out")),
        other => panic!("expected timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn report_serializes_with_action_records() {
    let data = Arc::new(FakeMarketData::default().with_closes("AAPL", flat_then_rise()));
    let broker = Arc::new(FakeBroker::new(100_000.0));

    let engine = Engine::new(
        data,
        broker,
        Arc::new(RecordingSink::default()),
        test_config(&["AAPL"]),
    );
    let report = engine.run_cycle().await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status_code"], 200);
    assert_eq!(json["results"][0]["symbol"], "AAPL");
    assert_eq!(json["results"][0]["action"], "nothing_to_sell");
}
