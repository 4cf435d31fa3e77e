//! Environment-driven configuration.
//!
//! | variable                   | default | meaning                          |
//! |----------------------------|---------|----------------------------------|
//! | `TRACKGATE_PORT`           | 7700    | TCP listen port                  |
//! | `TRACKGATE_PRINT_MODE`     | line    | event output: line, json, table  |
//! | `TRACKGATE_LOG_HEX`        | false   | hex-trace rejected frames        |
//! | `TRACKGATE_REGISTER_TOKEN` | OK      | token echoed on registration     |

use trackgate_core::{constants::DEFAULT_REGISTER_TOKEN, Error, Result};
use trackgate_session::PrintMode;

/// Resolved listener configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_port: u16,
    pub print_mode: PrintMode,
    pub log_hex: bool,
    pub register_token: String,
}

impl AppConfig {
    /// Load from process environment variables.
    ///
    /// # Errors
    /// Returns `Error::Config` when a variable is set but unparseable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let listen_port = match get("TRACKGATE_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                Error::Config(format!("TRACKGATE_PORT must be a port number, got {raw:?}"))
            })?,
            None => 7700,
        };

        let print_mode = match get("TRACKGATE_PRINT_MODE") {
            Some(raw) => raw.parse::<PrintMode>()?,
            None => PrintMode::Line,
        };

        let log_hex = match get("TRACKGATE_LOG_HEX") {
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(Error::Config(format!(
                        "TRACKGATE_LOG_HEX must be a boolean, got {other:?}"
                    )));
                }
            },
            None => false,
        };

        let register_token =
            get("TRACKGATE_REGISTER_TOKEN").unwrap_or_else(|| DEFAULT_REGISTER_TOKEN.to_string());

        Ok(AppConfig {
            listen_port,
            print_mode,
            log_hex,
            register_token,
        })
    }
}
