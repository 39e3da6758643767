//! Work order details API

mod cache;
mod client;

pub use cache::CachedDetailsLookup;
pub use client::DetailsClient;
