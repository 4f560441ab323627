// Trading strategy module

use crate::indicators::IndicatorFrame;
use crate::models::{IndicatorSnapshot, Signal};

/// RSI/EMA threshold strategy.
///
/// Evaluates only the most recent fully-defined indicator row, fresh each
/// cycle. No hysteresis, no state carried between invocations.
///
/// Rule order (first match wins):
/// 1. No fully-defined row -> InsufficientData
/// 2. RSI below `oversold` AND close below EMA -> Buy
/// 3. RSI above `overbought` AND close above EMA -> Sell
/// 4. Otherwise -> NoSignal
///
/// Inequalities are strict: values sitting exactly on a threshold, or a
/// close equal to the EMA, resolve to NoSignal.
#[derive(Debug, Clone, Copy)]
pub struct RsiEmaStrategy {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiEmaStrategy {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl RsiEmaStrategy {
    /// Evaluate the frame's last fully-defined row.
    pub fn evaluate(&self, frame: &IndicatorFrame) -> Signal {
        match frame.last_row() {
            Some(last) => self.decide(last),
            None => Signal::InsufficientData,
        }
    }

    /// Apply the threshold rule to a single prepared row.
    pub fn decide(&self, last: IndicatorSnapshot) -> Signal {
        if last.rsi < self.oversold && last.close < last.ema {
            Signal::Buy(last)
        } else if last.rsi > self.overbought && last.close > last.ema {
            Signal::Sell(last)
        } else {
            Signal::NoSignal(last)
        }
    }
}
