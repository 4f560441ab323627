use clap::Parser;
use equibot::api::{
    AlpacaDataClient, AlpacaTradingClient, Broker, EnvSecretStore, MarketData, SecretStore,
};
use equibot::metrics::{LogMetricsSink, MetricsSink};
use equibot::{Config, Engine, Result};
use std::sync::Arc;

/// Evaluate the configured symbols once and print the cycle report.
///
/// Designed to be triggered externally (cron, scheduler, queue): one
/// invocation is one cycle, with no state carried between runs.
#[derive(Parser, Debug)]
#[command(name = "equibot", version, about)]
struct Cli {
    /// Comma-separated symbol list, overriding SYMBOLS from the environment
    #[arg(long)]
    symbols: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(raw) = cli.symbols {
        config.symbols = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if config.symbols.is_empty() {
            return Err("--symbols contains no symbols".into());
        }
    }

    // Credentials are fatal: nothing runs without them
    let secrets = EnvSecretStore;
    let api_key = secrets.get_secret("ALPACA_API_KEY")?;
    let api_secret = secrets.get_secret("ALPACA_API_SECRET")?;

    let mut data_client = AlpacaDataClient::new(api_key.clone(), api_secret.clone());
    if let Some(url) = &config.data_base_url {
        data_client = data_client.with_base_url(url.clone());
    }

    let mut trading_client = AlpacaTradingClient::new(api_key, api_secret);
    if let Some(url) = &config.trading_base_url {
        trading_client = trading_client.with_base_url(url.clone());
    }

    let data: Arc<dyn MarketData> = Arc::new(data_client);
    let broker: Arc<dyn Broker> = Arc::new(trading_client);
    let metrics: Arc<dyn MetricsSink> = Arc::new(LogMetricsSink);

    tracing::info!(
        symbols = ?config.symbols,
        risk_fraction = config.risk_fraction,
        minutes_history = config.minutes_history,
        "starting trading cycle"
    );

    let engine = Engine::new(data, broker, metrics, config);
    let report = engine.run_cycle().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "equibot=info,metrics=info".to_string()),
        )
        .init();
}
