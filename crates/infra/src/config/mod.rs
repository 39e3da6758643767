//! Configuration loading and management
//!
//! Configuration is read from a TOML or JSON file, then secrets and a few
//! deployment knobs are overlaid from environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
