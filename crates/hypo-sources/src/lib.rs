//! Post and market-data collaborators.
//!
//! The runner only sees the [`PostSource`] and [`MarketDataSource`] traits.
//! [`ApifyClient`] and [`AlpacaClient`] are the HTTP-backed implementations;
//! both retry transient failures with jittered exponential back-off.

pub mod alpaca;
pub mod apify;
pub mod error;
pub mod http;
pub mod source;

mod retry;

pub use alpaca::AlpacaClient;
pub use apify::ApifyClient;
pub use error::SourceError;
pub use http::HttpSettings;
pub use source::{filter_posts, MarketDataSource, PostQuery, PostSource};
