//! Infrastructure error conversions

mod conversions;

pub use conversions::{provider_error, InfraError};
