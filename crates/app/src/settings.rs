//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `SPLITLEDGER_*` variables
//! (`SPLITLEDGER_APP__LEVEL`, `SPLITLEDGER_LEDGER__PATH`, ...).
//!
//! See `settings.example.toml` for the available keys.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// `tracing` level for the app and the engine.
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    /// JSON file holding the transaction log.
    pub path: String,
    /// Currency of a newly created ledger.
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub ledger: Ledger,
}

impl Settings {
    pub fn new(file: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("ledger.path", "splitledger.json")?
            .set_default("ledger.currency", "INR")?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("SPLITLEDGER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
