// Order execution and data collection module
pub mod executor;
pub mod fetcher;

pub use executor::OrderExecutor;
pub use fetcher::BarFetcher;
