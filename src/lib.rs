// Core modules
pub mod api;
pub mod config;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod metrics;
pub mod models;
pub mod risk;
pub mod strategy;

// Re-export commonly used types
pub use config::Config;
pub use engine::Engine;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
