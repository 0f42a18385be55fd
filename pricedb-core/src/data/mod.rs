//! Price sources: provider trait, Yahoo Finance, synthetic data, circuit breaker.

pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{
    DataError, DataProvider, DataSource, FetchResult, LogProgress, NoProgress, UpdateProgress,
    FULL_HISTORY_START,
};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
