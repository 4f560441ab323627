use anyhow::{bail, Context, Result};
use std::time::Duration;

const DEFAULT_SYMBOL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CYCLE_DEADLINE_SECS: u64 = 120;

/// Runtime configuration, resolved from the environment at startup.
/// Missing or invalid values are fatal: no symbol is evaluated with a
/// broken configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Symbols to evaluate each cycle.
    pub symbols: Vec<String>,
    /// Fraction of account equity committed per buy, in (0, 1].
    pub risk_fraction: f64,
    /// Lookback window of minute bars handed to the indicators.
    pub minutes_history: usize,
    /// Budget for a single symbol's pipeline.
    pub symbol_timeout: Duration,
    /// Budget for the whole cycle; in-flight work past this point is
    /// abandoned and reported as a per-symbol error.
    pub cycle_deadline: Duration,
    /// Market-data API base URL override.
    pub data_base_url: Option<String>,
    /// Trading API base URL override (defaults to the paper endpoint).
    pub trading_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let symbols = parse_symbols(
            &lookup("SYMBOLS").context("SYMBOLS not set (comma-separated symbol list)")?,
        )?;

        let risk_fraction: f64 = lookup("RISK_PCT")
            .context("RISK_PCT not set")?
            .parse()
            .context("RISK_PCT is not a number")?;
        if !(risk_fraction > 0.0 && risk_fraction <= 1.0) {
            bail!("RISK_PCT must be in (0, 1], got {}", risk_fraction);
        }

        let minutes_history: usize = lookup("MINUTES_HISTORY")
            .context("MINUTES_HISTORY not set")?
            .parse()
            .context("MINUTES_HISTORY is not a whole number of minutes")?;
        if minutes_history == 0 {
            bail!("MINUTES_HISTORY must be at least 1");
        }

        let symbol_timeout = parse_secs(&lookup, "SYMBOL_TIMEOUT_SECS", DEFAULT_SYMBOL_TIMEOUT_SECS)?;
        let cycle_deadline = parse_secs(&lookup, "CYCLE_DEADLINE_SECS", DEFAULT_CYCLE_DEADLINE_SECS)?;

        Ok(Self {
            symbols,
            risk_fraction,
            minutes_history,
            symbol_timeout,
            cycle_deadline,
            data_base_url: lookup("ALPACA_DATA_URL"),
            trading_base_url: lookup("ALPACA_TRADING_URL"),
        })
    }
}

fn parse_symbols(raw: &str) -> Result<Vec<String>> {
    let symbols: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if symbols.is_empty() {
        bail!("SYMBOLS contains no symbols: {:?}", raw);
    }
    Ok(symbols)
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default_secs: u64,
) -> Result<Duration> {
    let secs = match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} is not a whole number of seconds", key))?,
        None => default_secs,
    };
    Ok(Duration::from_secs(secs))
}
