use super::IndicatorColumn;

/// Calculate an Exponential Moving Average (EMA) series with smoothing
/// factor `alpha = 2 / (period + 1)`.
///
/// The series is seeded with the simple average of the first `period`
/// closes, so the first defined value sits at close index `period - 1`;
/// from there `ema[t] = close[t] * alpha + ema[t-1] * (1 - alpha)`.
pub fn ema_series(closes: &[f64], period: usize) -> IndicatorColumn {
    let defined_from = period.saturating_sub(1);
    if period == 0 || closes.len() < period {
        return IndicatorColumn {
            defined_from,
            values: Vec::new(),
        };
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    // Seed: simple average of the first `period` closes
    let mut ema = closes[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(closes.len() - defined_from);
    values.push(ema);

    for close in &closes[period..] {
        ema = close * alpha + ema * (1.0 - alpha);
        values.push(ema);
    }

    IndicatorColumn {
        defined_from,
        values,
    }
}
