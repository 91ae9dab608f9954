mod client;
mod config;

pub use client::{DocumentAccessor, FetchError, FetchResult, HttpAccessor};
pub use config::FetchConfig;
