//! Helpers shared by the binary and the status handlers

pub mod health;
pub mod logging;
