//! Shared HTTP plumbing for the portal, details and Graph adapters

mod client;

pub use client::{failure_body, HttpClient, HttpClientBuilder};
