use super::IndicatorColumn;

/// Calculate the Relative Strength Index (RSI) with Wilder smoothing
/// over a full close series.
///
/// The average gain and loss are seeded with the simple average of the
/// first `period` gains/losses, then updated with the recurrence
/// `avg[t] = (avg[t-1] * (period - 1) + x[t]) / period`. The first value
/// is defined at close index `period` (so `period + 1` closes are
/// required before any value exists).
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// A window with zero average loss reads as 100 (fully overbought); a
/// perfectly flat window (zero gain and zero loss) reads as a neutral 50.
pub fn wilder_rsi(closes: &[f64], period: usize) -> IndicatorColumn {
    let defined_from = period;
    if period == 0 || closes.len() < period + 1 {
        return IndicatorColumn {
            defined_from,
            values: Vec::new(),
        };
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    // Seed: simple average of the first `period` gains/losses
    let mut avg_gain: f64 = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(closes.len() - period);
    values.push(rsi_value(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        values.push(rsi_value(avg_gain, avg_loss));
    }

    IndicatorColumn {
        defined_from,
        values,
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            return 100.0;
        }
        return 50.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
