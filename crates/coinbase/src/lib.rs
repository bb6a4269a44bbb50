pub mod client;
pub mod fetcher;

pub use client::{CoinbaseClient, DEFAULT_ORDERS_URL};
pub use fetcher::{PageBatch, PaginatedFetcher, DEFAULT_CONCURRENCY};
