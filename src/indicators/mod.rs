// Technical indicators module
// Implements Wilder RSI and EMA over closing-price series

pub mod ema;
pub mod rsi;

pub use ema::ema_series;
pub use rsi::wilder_rsi;

use crate::models::IndicatorSnapshot;

/// RSI lookback period.
pub const RSI_PERIOD: usize = 14;
/// EMA period for the trend average.
pub const EMA_PERIOD: usize = 9;

/// One indicator computed over a close series, positionally aligned:
/// `values[i]` belongs to `closes[defined_from + i]`. Positions before
/// `defined_from` are undefined and carry no value at all.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub defined_from: usize,
    pub values: Vec<f64>,
}

impl IndicatorColumn {
    /// Value at close index `idx`, or `None` if undefined there.
    pub fn at(&self, idx: usize) -> Option<f64> {
        idx.checked_sub(self.defined_from)
            .and_then(|i| self.values.get(i))
            .copied()
    }
}

/// Parallel columns of close, RSI(14) and EMA(9), indexed by position
/// in the source close series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    closes: Vec<f64>,
    rsi: IndicatorColumn,
    ema: IndicatorColumn,
}

impl IndicatorFrame {
    /// Compute both indicators over `closes`. Deterministic, pure.
    pub fn compute(closes: &[f64]) -> Self {
        Self {
            closes: closes.to_vec(),
            rsi: wilder_rsi(closes, RSI_PERIOD),
            ema: ema_series(closes, EMA_PERIOD),
        }
    }

    /// First close index at which both indicators are defined.
    pub fn defined_from(&self) -> usize {
        self.rsi.defined_from.max(self.ema.defined_from)
    }

    /// Number of rows where both indicators are defined.
    pub fn defined_len(&self) -> usize {
        self.closes.len().saturating_sub(self.defined_from())
    }

    /// Row at close index `idx`, if both indicators are defined there.
    pub fn row(&self, idx: usize) -> Option<IndicatorSnapshot> {
        Some(IndicatorSnapshot {
            close: *self.closes.get(idx)?,
            rsi: self.rsi.at(idx)?,
            ema: self.ema.at(idx)?,
        })
    }

    /// The most recent fully-defined row. `None` when the series is too
    /// short for either indicator.
    pub fn last_row(&self) -> Option<IndicatorSnapshot> {
        self.row(self.closes.len().checked_sub(1)?)
    }
}
