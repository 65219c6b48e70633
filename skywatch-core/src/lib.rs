//! Core library for the `skywatch` CLI.
//!
//! This crate defines:
//! - The weather value model and the `WeatherRecord` aggregate
//! - Provider adapters behind a circuit breaker with degraded fallback
//! - A record store contract with an in-memory implementation
//! - The reporting service (cache-aside lookups, history, alerts)
//! - Interchangeable assessment strategies and their coordinator
//! - Configuration & credentials handling
//!
//! It is used by `skywatch-cli`, but can also be reused by other binaries or services.

pub mod assessment;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod record;
pub mod resilience;
pub mod service;
pub mod store;
pub mod units;

pub use assessment::{
    AssessmentStrategy, StrategyComparison, StrategyKind, StrategyVerdict, WeatherAssessor,
    strategy_by_name,
};
pub use config::{Config, ProviderConfig, ReportingSettings};
pub use error::{ProviderError, ProviderErrorKind, WeatherError};
pub use model::{Humidity, HumidityComfort, Location, Temperature, WeatherCondition, WindCategory, WindSpeed};
pub use provider::{ProviderId, WeatherSource};
pub use record::WeatherRecord;
pub use resilience::{CallPermit, CircuitBreaker, CircuitState, ResilientSource};
pub use service::WeatherService;
pub use store::{InMemoryWeatherStore, WeatherRecordStore};
