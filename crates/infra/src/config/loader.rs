//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Use `PLANSYNC_CONFIG` when set, otherwise probe the standard locations
//! 2. Parse JSON or TOML by file extension
//! 3. Overlay environment variables (secrets never need to live in the file)
//! 4. Validate cross-field rules
//!
//! ## Environment Variables
//! - `PLANSYNC_CONFIG`: Explicit config file path
//! - `PLANSYNC_PORTAL_PASSWORD`: Portal login password
//! - `PLANSYNC_DETAILS_TOKEN`: Bearer token for the details API
//! - `PLANSYNC_GRAPH_TENANT_ID`, `PLANSYNC_GRAPH_CLIENT_ID`,
//!   `PLANSYNC_GRAPH_CLIENT_SECRET`: Graph app registration
//! - `PLANSYNC_RUN_ON_START`: Whether to sync once at startup (true/false)
//! - `PORT`: Status server port
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./plansync.{toml,json}` or `./config.{toml,json}` (current directory)
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use plansync_domain::{Config, PlanSyncError, Result};

const CONFIG_NAMES: [&str; 4] = ["plansync.toml", "plansync.json", "config.toml", "config.json"];

/// Load, overlay and validate the configuration.
///
/// # Errors
/// Returns `PlanSyncError::Config` if no file is found, the file cannot be
/// parsed, an override is malformed or validation fails.
pub fn load() -> Result<Config> {
    let path = std::env::var_os("PLANSYNC_CONFIG").map(PathBuf::from);
    let mut config = load_from_file(path)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
///
/// # Errors
/// Returns `PlanSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PlanSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PlanSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PlanSyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Overlay environment variables onto a parsed configuration.
///
/// # Errors
/// Returns `PlanSyncError::Config` if `PORT` is not a valid port number.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(password) = env_opt("PLANSYNC_PORTAL_PASSWORD") {
        config.portal.password = Some(password);
    }
    if let Some(token) = env_opt("PLANSYNC_DETAILS_TOKEN") {
        config.details.token = Some(token);
    }
    if let Some(tenant) = env_opt("PLANSYNC_GRAPH_TENANT_ID") {
        config.graph.tenant_id = tenant;
    }
    if let Some(client_id) = env_opt("PLANSYNC_GRAPH_CLIENT_ID") {
        config.graph.client_id = client_id;
    }
    if let Some(secret) = env_opt("PLANSYNC_GRAPH_CLIENT_SECRET") {
        config.graph.client_secret = Some(secret);
    }
    config.scheduler.run_on_start =
        env_bool("PLANSYNC_RUN_ON_START", config.scheduler.run_on_start);
    if let Some(port) = env_opt("PORT") {
        config.server.port = port
            .parse()
            .map_err(|e| PlanSyncError::Config(format!("Invalid PORT '{}': {}", port, e)))?;
    }
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `PlanSyncError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PlanSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PlanSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(PlanSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Non-empty environment variable.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
